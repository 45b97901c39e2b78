//! 🪣 s3mirror — one-way bucket replication, the stubborn way.
//!
//! 🎬 "Everything in the source should exist in the destination." That's the whole plot.
//! Keys already at the destination are left alone, missing ones are copied whole,
//! and a key that fails never takes its neighbours down with it.
//!
//! 🦆 Nothing is ever deleted. The duck insisted.

pub mod app_config;
mod backends;
mod mirror;
mod progress;
mod supervisors;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

pub use app_config::{AppConfig, RuntimeConfig, load_config};
pub use backends::EndpointConfig;
pub use mirror::{FailedStage, KeyFailure, SyncOutcome};
pub use progress::RunTally;
pub use supervisors::{Completion, RunReport};

use backends::StoreBackend;
use progress::ProgressReporter;
use supervisors::Supervisor;

/// 🚀 Mirror source into destination, start to finish, no way to stop it politely.
pub async fn run(app_config: AppConfig) -> Result<RunReport> {
    run_until_cancelled(app_config, CancellationToken::new()).await
}

/// 🚀 Same as [`run`], but stops between keys once `cancel` fires.
///
/// 💀 `Err` means nothing can be trusted about the run: bad config, a client that
/// wouldn't build, or a listing that died. Per-key failures and cancellation come
/// back as `Ok(RunReport)`; read the tally and the [`Completion`].
pub async fn run_until_cancelled(
    app_config: AppConfig,
    cancel: CancellationToken,
) -> Result<RunReport> {
    app_config.validate()?;

    let the_source = StoreBackend::from_endpoint(&app_config.source)
        .context("💀 Could not build the source S3 client. Check source.* settings.")?;
    let the_destination = StoreBackend::from_endpoint(&app_config.destination)
        .context("💀 Could not build the destination S3 client. Check destination.* settings.")?;

    let the_reporter = ProgressReporter::stdout(app_config.runtime.show_progress_bar);

    Supervisor::new(
        the_source,
        the_destination,
        app_config.runtime,
        the_reporter,
    )
    .run(cancel)
    .await
    .into_result()
}
