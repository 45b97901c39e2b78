//! # Previously, on S3Mirror...
//!
//! 🎬 The buckets were far away. Behind TLS. Behind IAM. Behind a MinIO container someone
//! forgot to start. The tests needed a bucket so simple it lives entirely in RAM, gone the
//! moment you blink.
//!
//! That someone was this module.
//!
//! `in_mem` provides an [`ObjectStore`](super::ObjectStore) backed by a `BTreeMap` behind
//! an `Arc<Mutex<...>>`, so a test can hand one clone to the supervisor and keep another
//! to peek at afterwards. It can also be told to fail on purpose: per-key HEAD/GET/PUT
//! failures, a listing that dies after N keys, a listing that never starts. Chaos, on tap.
//!
//! 🦆
//!
//! ⚠️ This is NOT for production. It only compiles under `cfg(test)`. If you're deploying
//! this to prod, please also deploy a therapist.

mod in_mem_store;

pub(crate) use in_mem_store::{InMemoryKeyListing, InMemoryStore};
