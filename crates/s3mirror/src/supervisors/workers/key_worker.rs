//! 🎬 *[a queue fills with keys. somewhere, a KeyWorker waits.]*
//! *[the clock on the wall reads 2:47am.]*
//!
//! 🪞 The KeyWorker — patient, tireless, and deeply unbothered by the chaos happening
//! upstream. It takes a key. It mirrors the key. It reports the key. It asks no questions.
//!
//! ⚠️ Cancellation is only looked at between keys. Once a key is picked up, it is checked,
//! fetched and stored to the end. No half-copied objects on our watch.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::Worker;
use crate::backends::StoreBackend;
use crate::mirror::{KeyReport, SyncOutcome, mirror_object};

/// 🪞 Takes keys from the queue, mirrors them one at a time, reports back.
pub(crate) struct KeyWorker {
    worker_id: usize,
    rx: Receiver<String>,
    tx: Sender<KeyReport>,
    source: Arc<StoreBackend>,
    destination: Arc<StoreBackend>,
    cancel: CancellationToken,
}

impl KeyWorker {
    pub(crate) fn new(
        worker_id: usize,
        rx: Receiver<String>,
        tx: Sender<KeyReport>,
        source: Arc<StoreBackend>,
        destination: Arc<StoreBackend>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            worker_id,
            rx,
            tx,
            source,
            destination,
            cancel,
        }
    }

    async fn run(self) -> Result<()> {
        debug!("🧵 KeyWorker {} started draining the key queue", self.worker_id);
        loop {
            if self.cancel.is_cancelled() {
                debug!("🛑 KeyWorker {}: cancelled, clocking out", self.worker_id);
                return Ok(());
            }

            let key = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("🛑 KeyWorker {}: cancelled while idle", self.worker_id);
                    return Ok(());
                }
                received = self.rx.recv() => match received {
                    Ok(key) => key,
                    Err(_) => {
                        // -- 🏁 queue empty and closed. the listing is done (or dead).
                        debug!("🏁 KeyWorker {}: key queue closed. Shutting down.", self.worker_id);
                        return Ok(());
                    }
                },
            };

            let outcome = mirror_object(self.source.as_ref(), self.destination.as_ref(), &key).await;
            if let SyncOutcome::Failed(failure) = &outcome {
                warn!("⚠️ {key}: {failure}");
            }

            self.tx
                .send(KeyReport { key, outcome })
                .await
                .context("💀 KeyWorker lost the supervisor. The report channel is closed.")?;
        }
    }
}

impl Worker for KeyWorker {
    type Output = ();

    fn start(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}
