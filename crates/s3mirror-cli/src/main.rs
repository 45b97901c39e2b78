//! 🚀 s3mirror-cli — the front door, the bouncer, the maitre d' of s3mirror.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, wires ctrl-c to a cancellation token, and then lets the real
//! code do the heavy lifting. Like a manager. 🦆

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use s3mirror::{Completion, RunReport};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// -- 🔧 the ol' reliable
const DEFAULT_CONFIG_FILE: &str = "s3mirror.toml";
// -- 🛑 128 + SIGINT, the shell's way of saying "you pressed ctrl-c, didn't you"
const EXIT_CANCELLED: i32 = 130;

/// 🪣 Copy every object the destination bucket is missing from the source bucket.
/// Nothing is overwritten. Nothing is deleted. Run it again and it picks up where it left off.
#[derive(Debug, Parser)]
#[command(name = "s3mirror", version, about)]
struct Cli {
    /// TOML config file. Defaults to ./s3mirror.toml, and env vars alone if that isn't there.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keys to mirror at the same time. Overrides runtime.parallelism.
    #[arg(short, long, value_name = "N")]
    parallelism: Option<usize>,

    /// No spinner on stderr. The per-key lines on stdout stay.
    #[arg(long)]
    no_progress: bool,
}

/// 🚀 main() — where it all begins. The genesis. The big bang.
/// The "I pressed enter and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args
/// 3. Load config (the moment of truth)
/// 4. Run the thing, with ctrl-c standing by
/// 5. Turn the report into an exit code
#[tokio::main]
async fn main() {
    // 📡 Set up tracing — because println! debugging is a lifestyle choice
    // we're trying to move past, like flip phones and cargo shorts
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let exit_code = match mirror(cli).await {
        Ok(report) => exit_code_for(&report),
        Err(err) => {
            report_error(&err);
            1
        }
    };
    std::process::exit(exit_code);
}

async fn mirror(cli: Cli) -> Result<RunReport> {
    let config_file = resolve_config_file(cli.config.as_deref())?;

    // 🔧 the moment where we find out if the TOML is valid
    // or if someone put a tab where a space should be (looking at you, Kevin)
    let mut app_config = s3mirror::load_config(config_file.as_deref()).context(
        "💀 In s3mirror-cli, main, we couldn't load the configuration. Take a look at the file \
         and the environment, make sure nothing obvious is missing.",
    )?;
    if let Some(parallelism) = cli.parallelism {
        app_config.runtime.parallelism = parallelism;
    }
    if cli.no_progress {
        app_config.runtime.show_progress_bar = false;
    }

    let cancel = CancellationToken::new();
    let the_ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 ctrl-c received. Finishing the objects in flight, then stopping.");
            the_ctrl_c_token.cancel();
        }
    });

    // 🚀 SEND IT. No take-backs. This is not a drill. (validation happens in there, overrides included)
    s3mirror::run_until_cancelled(app_config, cancel).await
}

/// 🔒 An explicit `--config` must exist. The default one is optional.
fn resolve_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let (the_path, is_explicit) = match explicit {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    let exists = the_path.try_exists().with_context(|| {
        format!(
            "💀 Couldn't tell whether the configuration file exists. Maybe it's a permissions \
             thing, maybe it's a pwd/cwd thing. Use an absolute path to be absolutely certain. \
             Was checking here: '{}'",
            the_path.display()
        )
    })?;

    match (exists, is_explicit) {
        (true, _) => Ok(Some(the_path.to_path_buf())),
        (false, true) => anyhow::bail!(
            "💀 Configuration file '{}' does not exist. You asked for it by name, so we won't \
             pretend it's optional.",
            the_path.display()
        ),
        (false, false) => {
            // 💤 not there. like my motivation on Mondays. env vars it is.
            info!("🔧 No {DEFAULT_CONFIG_FILE} here, using environment variables only");
            Ok(None)
        }
    }
}

fn exit_code_for(report: &RunReport) -> i32 {
    match report.completion {
        Completion::Cancelled => EXIT_CANCELLED,
        Completion::EnumerationFailed(_) => 1,
        // -- ⚠️ failed keys were already warned about by the supervisor. still a finished run.
        Completion::Complete => 0,
    }
}

/// 💀 Error handling: the part where we find out what went wrong
/// and print it in a way that's helpful at 3am
fn report_error(err: &anyhow::Error) {
    error!("💀 error: {}", err);
    // -- 🧅 peel the onion of sadness, one tear-jerking layer at a time
    let mut the_vibes_are_giving_connection_issues = false;
    for cause in err.chain().skip(1) {
        error!("⚠️  cause: {}", cause);
        // -- 🕵️ sniff the cause like a truffle pig hunting for connection problems
        let cause_str = cause.to_string();
        if cause_str.contains("dispatch failure")
            || cause_str.contains("connection refused")
            || cause_str.contains("Connection refused")
            || cause_str.contains("tcp connect error")
            || cause_str.contains("dns error")
            || cause_str.contains("timed out")
        {
            the_vibes_are_giving_connection_issues = true;
        }
    }

    // -- 📡 if it smells like a connection problem, it's probably a connection problem
    // -- like when your wifi icon has full bars but nothing loads
    if the_vibes_are_giving_connection_issues {
        error!(
            "🔧 hint: looks like an S3 endpoint isn't reachable. \
            Double-check the endpoint, use_ssl and region settings for both buckets. \
            If the destination is a local MinIO, try `docker ps` to see what's up, \
            or `docker compose up -d` to resurrect it. ☕"
        );
    }
}
