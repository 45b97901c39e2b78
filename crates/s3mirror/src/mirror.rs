//! 🪞 The mirror: one key in, one verdict out.
//!
//! 🎬 *[a key arrives. the destination is asked a question. the answer decides everything.]*
//!
//! For every listed key:
//! 1. 🔍 [`existence_filter`] asks the destination "do you have this?"
//! 2. 📦 if not, [`transfer`] fetches the whole thing and stores the whole thing
//! 3. 🧾 the result becomes a [`SyncOutcome`] and goes back to the supervisor
//!
//! Nothing in here retries, and nothing in here panics. A key that fails is a `Failed`
//! outcome, never an `Err` that could take the whole run down with it.
//!
//! 🦆 The duck checks its reflection. The reflection is eventually consistent.

pub(crate) mod existence_filter;
pub(crate) mod transfer;

use crate::backends::ObjectStore;
use existence_filter::Presence;
use tracing::trace;

/// 🎯 Which step of a key's journey went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    /// 🔍 the destination HEAD failed with something other than not-found
    ExistenceCheck,
    /// 📥 reading from the source failed
    Fetch,
    /// 📤 writing to the destination failed
    Store,
}

impl std::fmt::Display for FailedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let the_label = match self {
            FailedStage::ExistenceCheck => "existence check at destination",
            FailedStage::Fetch => "fetch from source",
            FailedStage::Store => "store to destination",
        };
        f.write_str(the_label)
    }
}

/// 💀 A key that did not make it, and where it fell.
#[derive(Debug)]
pub struct KeyFailure {
    pub stage: FailedStage,
    pub error: anyhow::Error,
}

impl KeyFailure {
    pub(crate) fn new(stage: FailedStage, error: anyhow::Error) -> Self {
        Self { stage, error }
    }
}

impl std::fmt::Display for KeyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🧅 `{:#}` peels the whole anyhow onion onto one line
        write!(f, "{}: {:#}", self.stage, self.error)
    }
}

/// 🧾 The verdict for one key.
#[derive(Debug)]
pub enum SyncOutcome {
    /// ⏭️ already at the destination, by key. Content is not compared.
    Skipped,
    /// ✅ copied over, this many bytes
    Transferred { bytes: u64 },
    /// 💀 something broke; the run keeps going anyway
    Failed(KeyFailure),
}

/// 📨 What a KeyWorker sends back to the supervisor.
#[derive(Debug)]
pub struct KeyReport {
    pub key: String,
    pub outcome: SyncOutcome,
}

/// 🪞 Run one key through check → maybe fetch → maybe store.
///
/// Steps for a single key never interleave. The payload (if any) lives only inside
/// [`transfer::transfer_object`] and is gone by the time this returns.
pub(crate) async fn mirror_object<S, D>(source: &S, destination: &D, key: &str) -> SyncOutcome
where
    S: ObjectStore + ?Sized,
    D: ObjectStore + ?Sized,
{
    match existence_filter::check(destination, key).await {
        Ok(Presence::Present) => {
            trace!("⏭️ {key} already at destination, skipping");
            return SyncOutcome::Skipped;
        }
        Ok(Presence::Absent) => trace!("🔍 {key} missing at destination, transferring"),
        Err(failure) => return SyncOutcome::Failed(failure),
    }

    match transfer::transfer_object(source, destination, key).await {
        Ok(bytes) => SyncOutcome::Transferred { bytes },
        Err(failure) => SyncOutcome::Failed(failure),
    }
}
