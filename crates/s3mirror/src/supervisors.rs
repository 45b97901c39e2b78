//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where buckets drift apart..."
//! 🎬 "One supervisor dared to bring them back together."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor module — the sync driver. Part middle manager, part helicopter parent.
//!
//! ```text
//!  source ──list──▶ ListingWorker ──keys──▶ [bounded queue] ──▶ KeyWorker × N ──reports──▶ Supervisor
//!                                                                  │  check → fetch → store       │
//!                                                                  ▼                               ▼
//!                                                             destination                  stdout lines
//! ```
//!
//! Per-key failures are just lines in the report. A listing failure ends the run
//! without claiming completeness. Cancellation stops the run between keys.
//!
//! ⚠️ DO NOT MAKE THE WORKERS PUB EVER
//! 🔒 Like Fight Club, but for async tasks. First rule: you don't pub the workers.

mod workers;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::app_config::RuntimeConfig;
use crate::backends::{ObjectStore, StoreBackend};
use crate::progress::{ProgressReporter, RunTally};
use workers::{KeyWorker, ListingEnd, ListingWorker, Worker};

/// 🏁 How a run ended.
#[derive(Debug)]
pub enum Completion {
    /// ✅ the listing ran dry and every listed key got a verdict
    Complete,
    /// 🛑 stopped by cancellation between keys; some keys were never looked at
    Cancelled,
    /// 💀 the source listing broke; we cannot know what we missed
    EnumerationFailed(anyhow::Error),
}

impl Completion {
    fn label(&self) -> &'static str {
        match self {
            Completion::Complete => "complete",
            Completion::Cancelled => "cancelled (incomplete)",
            Completion::EnumerationFailed(_) => "listing failed (incomplete)",
        }
    }
}

/// 🧾 Everything a run has to say for itself.
#[derive(Debug)]
pub struct RunReport {
    pub keys_listed: u64,
    pub tally: RunTally,
    pub elapsed: Duration,
    pub completion: Completion,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        matches!(self.completion, Completion::Complete)
    }

    /// 💀 A failed listing becomes an error. Everything else, per-key failures and
    /// cancellation included, stays a report for the caller to read.
    pub fn into_result(self) -> Result<RunReport> {
        match self.completion {
            Completion::EnumerationFailed(err) => Err(err.context(format!(
                "💀 Run incomplete: the source listing failed. {} keys were processed \
                 ({} transferred, {} skipped, {} failed) before it broke.",
                self.tally.processed,
                self.tally.transferred,
                self.tally.skipped,
                self.tally.failed
            ))),
            _ => Ok(self),
        }
    }
}

/// 📦 The Supervisor: because even async tasks need someone hovering over them
/// asking "is it done yet?" every 5 milliseconds.
#[derive(Debug)]
pub(crate) struct Supervisor {
    source: Arc<StoreBackend>,
    destination: Arc<StoreBackend>,
    runtime: RuntimeConfig,
    reporter: ProgressReporter,
}

impl Supervisor {
    /// 🚀 Birth of a Supervisor. It's like a baby, but less crying.
    pub(crate) fn new(
        source: StoreBackend,
        destination: StoreBackend,
        runtime: RuntimeConfig,
        reporter: ProgressReporter,
    ) -> Self {
        Self {
            source: Arc::new(source),
            destination: Arc::new(destination),
            runtime,
            reporter,
        }
    }

    /// 🧵 One full pass: list, check, copy, report. Never returns early on a per-key failure.
    pub(crate) async fn run(mut self, cancel: CancellationToken) -> RunReport {
        info!(
            "🚀 Mirroring {} → {} with {} worker(s)",
            self.source.describe(),
            self.destination.describe(),
            self.runtime.parallelism
        );

        let (key_tx, key_rx) = async_channel::bounded::<String>(self.runtime.queue_capacity);
        let (report_tx, report_rx) = async_channel::bounded(self.runtime.queue_capacity);

        let listing_handle =
            ListingWorker::new(self.source.clone(), key_tx, cancel.clone()).start();
        let key_handles: Vec<_> = (0..self.runtime.parallelism)
            .map(|worker_id| {
                KeyWorker::new(
                    worker_id,
                    key_rx.clone(),
                    report_tx.clone(),
                    self.source.clone(),
                    self.destination.clone(),
                    cancel.clone(),
                )
                .start()
            })
            .collect();
        // -- 🔒 only the workers hold these now, so the channels close when the workers do
        drop(key_rx);
        drop(report_tx);

        while let Ok(report) = report_rx.recv().await {
            self.reporter.record(&report);
        }

        // 🧹 draining: every KeyWorker has dropped its sender, so they're all done or dead
        for handle in key_handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("💀 KeyWorker gave up: {err:#}"),
                Err(join_err) => error!("💀 KeyWorker panicked: {join_err}"),
            }
        }

        let the_listing = listing_handle
            .await
            .context("💀 ListingWorker panicked mid-listing")
            .and_then(|listing| listing);

        let the_tally = self.reporter.tally();
        let (keys_listed, completion) = match the_listing {
            Err(err) => (the_tally.processed, Completion::EnumerationFailed(err)),
            Ok(ListingEnd {
                keys_listed,
                cancelled,
            }) => {
                let the_queue_was_abandoned = the_tally.processed < keys_listed;
                if cancelled || (cancel.is_cancelled() && the_queue_was_abandoned) {
                    (keys_listed, Completion::Cancelled)
                } else {
                    (keys_listed, Completion::Complete)
                }
            }
        };

        self.reporter.finish(keys_listed, completion.label());

        match &completion {
            Completion::Complete if the_tally.failed > 0 => warn!(
                "⚠️ Run finished with {} failed key(s) out of {}. Run again to retry them.",
                the_tally.failed, the_tally.processed
            ),
            Completion::Complete => info!(
                "✅ Run complete: {} transferred, {} skipped",
                the_tally.transferred, the_tally.skipped
            ),
            Completion::Cancelled => warn!(
                "🛑 Run cancelled after {} of {} listed keys",
                the_tally.processed, keys_listed
            ),
            Completion::EnumerationFailed(err) => error!("💀 Run incomplete: {err:#}"),
        }

        RunReport {
            keys_listed,
            tally: the_tally,
            elapsed: self.reporter.elapsed(),
            completion,
        }
    }
}
