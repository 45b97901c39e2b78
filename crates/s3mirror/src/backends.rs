//! 🔌 Backends — where the real I/O happens.
//!
//! 🪣 Every bucket we touch, source or destination, hides behind the same four verbs:
//! `list`, `exists`, `fetch`, `store`. The mirror engine never learns whether it is
//! talking to a MinIO box under someone's desk or a region full of AWS hardware.
//!
//! 🎭 Pattern (same as it ever was): trait → concrete impls → `StoreBackend` enum that
//! dispatches. Listings get the same treatment via `KeyListing` / `KeyListingBackend`.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

mod endpoint_config;
#[cfg(test)]
pub(crate) mod in_mem;
pub(crate) mod s3;

pub use endpoint_config::EndpointConfig;

/// 📦 One object's body plus the little metadata we carry across.
///
/// Held fully in memory for exactly one transfer. Once `store` returns (or fails),
/// whoever owned it drops it and the bytes go back to the allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectPayload {
    pub(crate) body: Bytes,
    /// 🏷️ `Content-Type` as the source reported it, replayed on the put. Optional, like flossing.
    pub(crate) content_type: Option<String>,
}

impl ObjectPayload {
    pub(crate) fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
        }
    }

    pub(crate) fn size(&self) -> u64 {
        self.body.len() as u64
    }
}

/// 📜 A lazy, one-way walk over the keys of a bucket.
///
/// # Contract 📜
/// - `Ok(Some(key))` while keys flow, in whatever order the store feels like.
/// - `Ok(None)` = EOF. The listing is complete. Only now may anyone claim completeness.
/// - `Err(..)` = the listing is broken and must not be resumed. Callers stop here.
#[async_trait]
pub(crate) trait KeyListing: Send {
    async fn next_key(&mut self) -> Result<Option<String>>;
}

/// 🪣 The capability every endpoint must provide.
///
/// # Contract 📜
/// - `exists` returns `Ok(false)` ONLY for a genuine not-found. Timeouts, 403s, DNS sadness:
///   those are `Err`, never "absent". Otherwise an outage looks like a to-do list.
/// - `fetch` fails on anything that is not a full body, not-found included.
/// - `store` publishes the whole payload in one call. Readers see all of it or none of it.
#[async_trait]
pub(crate) trait ObjectStore: std::fmt::Debug + Send + Sync {
    /// 📜 Start a recursive listing of the bucket.
    async fn list(&self) -> Result<KeyListingBackend>;
    /// 🔍 Is there an object under `key`?
    async fn exists(&self, key: &str) -> Result<bool>;
    /// 📥 Read the whole object into memory.
    async fn fetch(&self, key: &str) -> Result<ObjectPayload>;
    /// 📤 Write the whole object under `key`.
    async fn store(&self, key: &str, payload: ObjectPayload) -> Result<()>;
    /// 🏷️ Something a human can read in a log line, e.g. `s3://bucket/prefix`.
    fn describe(&self) -> String;
}

/// 🎭 The many faces of a bucket.
///
/// The in-memory variant only exists under test. Production gets S3 and only S3,
/// which is the point of the whole crate anyway.
#[derive(Debug)]
pub(crate) enum StoreBackend {
    S3(s3::S3Store),
    #[cfg(test)]
    InMemory(in_mem::InMemoryStore),
}

impl StoreBackend {
    /// 🏗️ Build the backend for one configured endpoint. No network traffic happens here;
    /// a bad endpoint shows up on the first real call.
    pub(crate) fn from_endpoint(endpoint: &EndpointConfig) -> Result<Self> {
        Ok(StoreBackend::S3(s3::S3Store::new(endpoint)?))
    }
}

#[async_trait]
impl ObjectStore for StoreBackend {
    async fn list(&self) -> Result<KeyListingBackend> {
        match self {
            StoreBackend::S3(store) => store.list().await,
            #[cfg(test)]
            StoreBackend::InMemory(store) => store.list().await,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self {
            StoreBackend::S3(store) => store.exists(key).await,
            #[cfg(test)]
            StoreBackend::InMemory(store) => store.exists(key).await,
        }
    }

    async fn fetch(&self, key: &str) -> Result<ObjectPayload> {
        match self {
            StoreBackend::S3(store) => store.fetch(key).await,
            #[cfg(test)]
            StoreBackend::InMemory(store) => store.fetch(key).await,
        }
    }

    async fn store(&self, key: &str, payload: ObjectPayload) -> Result<()> {
        match self {
            StoreBackend::S3(store) => store.store(key, payload).await,
            #[cfg(test)]
            StoreBackend::InMemory(store) => store.store(key, payload).await,
        }
    }

    fn describe(&self) -> String {
        match self {
            StoreBackend::S3(store) => store.describe(),
            #[cfg(test)]
            StoreBackend::InMemory(store) => store.describe(),
        }
    }
}

/// 🎭 Listing flavors, one per backend. Same dispatch trick, smaller cast.
pub(crate) enum KeyListingBackend {
    S3(s3::S3KeyListing),
    #[cfg(test)]
    InMemory(in_mem::InMemoryKeyListing),
}

#[async_trait]
impl KeyListing for KeyListingBackend {
    async fn next_key(&mut self) -> Result<Option<String>> {
        match self {
            KeyListingBackend::S3(listing) => listing.next_key().await,
            #[cfg(test)]
            KeyListingBackend::InMemory(listing) => listing.next_key().await,
        }
    }
}
