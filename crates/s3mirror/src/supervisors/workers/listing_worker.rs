//! 🎬 *[a paginator turns a page. then another. somewhere, a queue fills up.]*
//!
//! 📜 The ListingWorker — walks the source listing and feeds keys into the key queue.
//! It never holds more than one page of keys itself; the bounded queue is the only
//! other place keys wait, so a bucket with a billion keys costs the same memory as one
//! with ten.
//!
//! 💀 A listing error is the end of the line. We can't know which keys we never saw,
//! so we stop, say so loudly, and let the supervisor call the run incomplete.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_channel::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Worker;
use crate::backends::{KeyListing, ObjectStore, StoreBackend};

/// 🏁 How the listing ended, when it ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListingEnd {
    /// 📬 keys handed to the queue
    pub(crate) keys_listed: u64,
    /// 🛑 stopped by the cancellation token before the listing ran dry
    pub(crate) cancelled: bool,
}

/// 📜 Pages through the source and pushes keys into the queue.
pub(crate) struct ListingWorker {
    source: Arc<StoreBackend>,
    tx: Sender<String>,
    cancel: CancellationToken,
}

impl ListingWorker {
    pub(crate) fn new(
        source: Arc<StoreBackend>,
        tx: Sender<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self { source, tx, cancel }
    }

    async fn run(self) -> Result<ListingEnd> {
        let the_label = self.source.describe();
        debug!("📜 ListingWorker started on {the_label}");

        let mut the_listing = self
            .source
            .list()
            .await
            .with_context(|| format!("💀 Could not start listing {the_label}. Nothing was synced."))?;

        let mut keys_listed = 0u64;
        let cancelled = ListingEnd {
            keys_listed: 0,
            cancelled: true,
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(ListingEnd { keys_listed, ..cancelled }),
                next = the_listing.next_key() => next,
            };

            let Some(key) = next.with_context(|| {
                format!(
                    "💀 Listing {the_label} failed after {keys_listed} keys. \
                     The key set is incomplete; refusing to call this run finished."
                )
            })?
            else {
                debug!("🏁 ListingWorker: {the_label} exhausted after {keys_listed} keys");
                return Ok(ListingEnd {
                    keys_listed,
                    cancelled: false,
                });
            };

            // 📬 waiting for room in the queue is a fine place to be interrupted
            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(ListingEnd { keys_listed, ..cancelled }),
                sent = self.tx.send(key) => sent,
            };
            if sent.is_err() {
                if self.cancel.is_cancelled() {
                    return Ok(ListingEnd { keys_listed, ..cancelled });
                }
                bail!(
                    "💀 Every KeyWorker has left the building after {keys_listed} keys. \
                     Nobody is left to take the rest."
                );
            }
            keys_listed += 1;
        }
    }
}

impl Worker for ListingWorker {
    type Output = ListingEnd;

    fn start(self) -> JoinHandle<Result<ListingEnd>> {
        tokio::spawn(self.run())
    }
}
