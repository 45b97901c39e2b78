//! 🧵 Workers: the ones who actually do the work while the Supervisor takes all the
//! credit in the sprint retro.
//!
//! 🏭 Two kinds on this factory floor:
//! - [`ListingWorker`]: pages through the source listing and drops keys into the queue.
//! - [`KeyWorker`]: takes one key at a time out of the queue and mirrors it.
//!
//! ⚠️ "If you're reading this, the code review went poorly."

use anyhow::Result;
use tokio::task::JoinHandle;

mod key_worker;
mod listing_worker;

pub(crate) use key_worker::KeyWorker;
pub(crate) use listing_worker::{ListingEnd, ListingWorker};

/// 🏗️ A background worker, that does work. duh.
///
/// "What's the DEAL with lifetime annotations? You borrow something,
///  you give it back. It's not that hard, Jerry!" — Seinfeld, on Rust
pub(crate) trait Worker {
    /// 🧾 what the worker hands back when it clocks out
    type Output: Send + 'static;

    /// 🚀 Start the worker. Returns a JoinHandle because we trust
    /// but verify. Mostly verify. Okay, we don't trust at all.
    fn start(self) -> JoinHandle<Result<Self::Output>>;
}
