use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::backends::{KeyListing, KeyListingBackend, ObjectPayload, ObjectStore};

/// 📦 A bucket that never forgets. Unless the test tells it to fail. Then it fails beautifully.
///
/// Clone-able because tests need to peek inside after handing a copy off to the
/// supervisor. The `Arc` means everyone shares the same map. Communist data, but
/// in a good way. The borrow checker approved. Barely. It had notes.
#[derive(Debug, Clone)]
pub(crate) struct InMemoryStore {
    name: String,
    state: Arc<Mutex<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    objects: BTreeMap<String, ObjectPayload>,
    faults: Faults,
    calls: CallLog,
}

/// 💣 Things this bucket will do wrong when asked nicely.
#[derive(Debug, Default)]
struct Faults {
    exists: HashSet<String>,
    fetch: HashSet<String>,
    store: HashSet<String>,
    listing_fails_after: Option<usize>,
    listing_refuses_to_start: bool,
    // -- 🛑 pull the plug on a run the moment this key gets fetched
    cancel_on_fetch: Option<(String, CancellationToken)>,
}

/// 📒 Every call, in order. The "I told you I never fetched that" evidence locker.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct CallLog {
    pub(crate) checked: Vec<String>,
    pub(crate) fetched: Vec<String>,
    pub(crate) stored: Vec<String>,
}

impl InMemoryStore {
    /// 🚀 A fresh, empty bucket with a name for log lines.
    pub(crate) fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(InMemoryState::default())),
        }
    }

    /// 🚀 A bucket pre-stuffed with `(key, body)` pairs.
    pub(crate) async fn with_objects(name: &str, objects: &[(&str, &str)]) -> Self {
        let the_store = Self::named(name);
        for (key, body) in objects {
            the_store.insert(key, body.as_bytes().to_vec()).await;
        }
        the_store
    }

    pub(crate) async fn insert(&self, key: &str, body: impl Into<Bytes>) {
        self.state
            .lock()
            .await
            .objects
            .insert(key.to_string(), ObjectPayload::new(body));
    }

    /// 🔍 Snapshot of what's in the bucket right now, key → body.
    pub(crate) async fn objects(&self) -> BTreeMap<String, Bytes> {
        self.state
            .lock()
            .await
            .objects
            .iter()
            .map(|(key, payload)| (key.clone(), payload.body.clone()))
            .collect()
    }

    pub(crate) async fn calls(&self) -> CallLog {
        self.state.lock().await.calls.clone()
    }

    pub(crate) async fn fail_exists_for(&self, key: &str) {
        self.state.lock().await.faults.exists.insert(key.to_string());
    }

    pub(crate) async fn fail_fetch_for(&self, key: &str) {
        self.state.lock().await.faults.fetch.insert(key.to_string());
    }

    pub(crate) async fn fail_store_for(&self, key: &str) {
        self.state.lock().await.faults.store.insert(key.to_string());
    }

    /// 💣 The listing yields `count` keys, then errors.
    pub(crate) async fn fail_listing_after(&self, count: usize) {
        self.state.lock().await.faults.listing_fails_after = Some(count);
    }

    /// 💣 `list()` itself errors. Nothing is ever yielded.
    pub(crate) async fn refuse_listing(&self) {
        self.state.lock().await.faults.listing_refuses_to_start = true;
    }

    /// 🛑 Cancel `token` from inside the fetch of `key`, i.e. mid-transfer.
    pub(crate) async fn cancel_when_fetching(&self, key: &str, token: CancellationToken) {
        self.state.lock().await.faults.cancel_on_fetch = Some((key.to_string(), token));
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn list(&self) -> Result<KeyListingBackend> {
        let the_state = self.state.lock().await;
        if the_state.faults.listing_refuses_to_start {
            bail!("💀 mem://{} refused to list. Access denied, vibes denied.", self.name);
        }
        Ok(KeyListingBackend::InMemory(InMemoryKeyListing {
            name: self.name.clone(),
            keys: the_state.objects.keys().cloned().collect(),
            fails_after: the_state.faults.listing_fails_after,
            yielded: 0,
        }))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut the_state = self.state.lock().await;
        the_state.calls.checked.push(key.to_string());
        if the_state.faults.exists.contains(key) {
            bail!("💀 HEAD mem://{}/{} → 403 Forbidden. Not a 404. Very different energy.", self.name, key);
        }
        Ok(the_state.objects.contains_key(key))
    }

    async fn fetch(&self, key: &str) -> Result<ObjectPayload> {
        let mut the_state = self.state.lock().await;
        the_state.calls.fetched.push(key.to_string());
        if let Some((cancel_key, token)) = &the_state.faults.cancel_on_fetch {
            if cancel_key == key {
                token.cancel();
            }
        }
        if the_state.faults.fetch.contains(key) {
            bail!("💀 GET mem://{}/{} → connection reset by peer.", self.name, key);
        }
        match the_state.objects.get(key) {
            Some(payload) => Ok(payload.clone()),
            None => bail!("💀 GET mem://{}/{} → NoSuchKey.", self.name, key),
        }
    }

    async fn store(&self, key: &str, payload: ObjectPayload) -> Result<()> {
        let mut the_state = self.state.lock().await;
        the_state.calls.stored.push(key.to_string());
        if the_state.faults.store.contains(key) {
            bail!("💀 PUT mem://{}/{} → quota exceeded. The bucket is full. Of feelings.", self.name, key);
        }
        // ✅ one insert, whole payload. atomic by virtue of the mutex.
        the_state.objects.insert(key.to_string(), payload);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("mem://{}", self.name)
    }
}

/// 📜 A snapshot of the keys at `list()` time, handed out one by one.
#[derive(Debug)]
pub(crate) struct InMemoryKeyListing {
    name: String,
    keys: VecDeque<String>,
    fails_after: Option<usize>,
    yielded: usize,
}

#[async_trait]
impl KeyListing for InMemoryKeyListing {
    async fn next_key(&mut self) -> Result<Option<String>> {
        if self.fails_after.is_some_and(|limit| self.yielded >= limit) {
            bail!(
                "💀 mem://{} listing blew up after {} keys. The continuation token is gone.",
                self.name,
                self.yielded
            );
        }
        let the_key = self.keys.pop_front();
        if the_key.is_some() {
            self.yielded += 1;
        }
        Ok(the_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(listing: &mut KeyListingBackend) -> (Vec<String>, Option<anyhow::Error>) {
        let mut the_keys = Vec::new();
        loop {
            match listing.next_key().await {
                Ok(Some(key)) => the_keys.push(key),
                Ok(None) => return (the_keys, None),
                Err(err) => return (the_keys, Some(err)),
            }
        }
    }

    #[tokio::test]
    async fn the_one_where_missing_keys_are_absent_not_errors() {
        let the_store = InMemoryStore::with_objects("dst", &[("a.txt", "hello")]).await;
        assert!(the_store.exists("a.txt").await.expect("💀 exists should work"));
        assert!(!the_store.exists("nope.txt").await.expect("💀 absent is not an error"));
    }

    #[tokio::test]
    async fn the_one_where_an_exists_fault_is_an_error_not_a_false() {
        let the_store = InMemoryStore::named("dst");
        the_store.fail_exists_for("x").await;
        assert!(the_store.exists("x").await.is_err());
    }

    #[tokio::test]
    async fn the_one_where_the_listing_dies_after_two_keys() {
        let the_store =
            InMemoryStore::with_objects("src", &[("a", "1"), ("b", "2"), ("c", "3")]).await;
        the_store.fail_listing_after(2).await;

        let mut the_listing = the_store.list().await.expect("💀 listing should start");
        let (the_keys, the_error) = drain(&mut the_listing).await;

        assert_eq!(the_keys, vec!["a".to_string(), "b".to_string()]);
        assert!(the_error.is_some(), "the listing was supposed to explode");
    }

    #[tokio::test]
    async fn the_one_where_fetch_of_a_missing_key_fails() {
        let the_store = InMemoryStore::named("src");
        assert!(the_store.fetch("ghost").await.is_err());
        assert_eq!(the_store.calls().await.fetched, vec!["ghost".to_string()]);
    }
}
