//! 🔍 Existence Filter — "do you already have this one?"
//!
//! The only question asked of the destination before any bytes move. Presence by key
//! is the whole criterion: no ETag comparison, no size check, no timestamps. If it's
//! there, it's done. Stale content at the destination stays stale, forever, by contract.
//!
//! ⚠️ The one rule that matters: only a real not-found means "go fetch it". A HEAD that
//! fails for any other reason (403, timeout, DNS having a day) is a per-key failure.
//! Treating those as "absent" would turn a destination outage into a copy storm.

use crate::backends::ObjectStore;
use crate::mirror::{FailedStage, KeyFailure};

/// 🚦 What the destination said about a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Presence {
    Present,
    Absent,
}

/// 🔍 Ask `destination` about `key`.
pub(crate) async fn check<D>(destination: &D, key: &str) -> Result<Presence, KeyFailure>
where
    D: ObjectStore + ?Sized,
{
    match destination.exists(key).await {
        Ok(true) => Ok(Presence::Present),
        Ok(false) => Ok(Presence::Absent),
        Err(error) => Err(KeyFailure::new(FailedStage::ExistenceCheck, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_mem::InMemoryStore;

    #[tokio::test]
    async fn the_one_where_the_filter_reports_both_answers() {
        let the_destination = InMemoryStore::with_objects("dst", &[("here", "1")]).await;

        assert_eq!(
            check(&the_destination, "here").await.expect("💀 should not fail"),
            Presence::Present
        );
        assert_eq!(
            check(&the_destination, "not-here").await.expect("💀 should not fail"),
            Presence::Absent
        );
    }

    #[tokio::test]
    async fn the_one_where_an_outage_is_not_mistaken_for_absence() {
        let the_destination = InMemoryStore::named("dst");
        the_destination.fail_exists_for("k").await;

        let the_failure = check(&the_destination, "k")
            .await
            .expect_err("💀 a broken HEAD must not look like an empty bucket");
        assert_eq!(the_failure.stage, FailedStage::ExistenceCheck);
    }
}
