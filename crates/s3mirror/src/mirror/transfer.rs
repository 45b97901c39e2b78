//! 📦 Transfer Unit — fetch it all, then put it all.
//!
//! 🧠 Knowledge graph:
//! - Fetch: whole object into memory (`ObjectPayload`). No streaming passthrough.
//! - Store: one call, whole payload, same key. The destination never sees half an object.
//! - Not transactional: die between the two and the key is simply still missing.
//!   Next run's existence check says "absent" and we try again. Idempotence for free.
//! - The payload is owned by `transfer_object` and moved into `store`. When that call
//!   returns, success or not, the buffer is gone. One payload per key, never more.

use tracing::trace;

use crate::backends::ObjectStore;
use crate::mirror::{FailedStage, KeyFailure};

/// 📦 Copy `key` from `source` to `destination`. Returns the number of bytes written.
pub(crate) async fn transfer_object<S, D>(
    source: &S,
    destination: &D,
    key: &str,
) -> Result<u64, KeyFailure>
where
    S: ObjectStore + ?Sized,
    D: ObjectStore + ?Sized,
{
    let the_payload = source
        .fetch(key)
        .await
        .map_err(|error| KeyFailure::new(FailedStage::Fetch, error))?;

    let the_size = the_payload.size();
    trace!("📥 {key}: {the_size} bytes in hand, storing");

    destination
        .store(key, the_payload)
        .await
        .map_err(|error| KeyFailure::new(FailedStage::Store, error))?;

    Ok(the_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_mem::InMemoryStore;

    #[tokio::test]
    async fn the_one_where_bytes_cross_the_gap_intact() {
        let the_source = InMemoryStore::with_objects("src", &[("k", "0123456789abcdef")]).await;
        let the_destination = InMemoryStore::named("dst");

        let the_bytes = transfer_object(&the_source, &the_destination, "k")
            .await
            .expect("💀 a healthy transfer should not fail");

        assert_eq!(the_bytes, 16);
        assert_eq!(the_destination.objects().await["k"], "0123456789abcdef");
    }

    #[tokio::test]
    async fn the_one_where_a_fetch_failure_never_reaches_the_destination() {
        let the_source = InMemoryStore::with_objects("src", &[("k", "data")]).await;
        the_source.fail_fetch_for("k").await;
        let the_destination = InMemoryStore::named("dst");

        let the_failure = transfer_object(&the_source, &the_destination, "k")
            .await
            .expect_err("💀 fetch was rigged to fail");

        assert_eq!(the_failure.stage, FailedStage::Fetch);
        assert!(the_destination.calls().await.stored.is_empty());
    }

    #[tokio::test]
    async fn the_one_where_a_store_failure_leaves_no_partial_object() {
        let the_source = InMemoryStore::with_objects("src", &[("k", "data")]).await;
        let the_destination = InMemoryStore::named("dst");
        the_destination.fail_store_for("k").await;

        let the_failure = transfer_object(&the_source, &the_destination, "k")
            .await
            .expect_err("💀 store was rigged to fail");

        assert_eq!(the_failure.stage, FailedStage::Store);
        assert!(the_destination.objects().await.is_empty());
    }
}
