// SPDX-License-Identifier: MIT

//! Operator-facing CLI for the recognition fleet controller. Deploys a
//! chapter's workers, logs their health on a timer, and tears them down
//! gracefully on Ctrl-C. A standalone demo/ops surface, not a daemon — each
//! invocation owns its worker processes for its own lifetime.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod chapters;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use signrt_controller::{ControllerConfig, FleetController, LocalObjectStore};
use signrt_core::ChapterId;

/// Deploy a chapter's recognition workers and keep them running until
/// interrupted.
#[derive(Parser, Debug)]
#[command(name = "signrt")]
struct Args {
    /// Chapter to deploy.
    #[arg(long)]
    chapter: String,

    /// Path to a JSON file describing chapters and lessons (stands in for the
    /// real document store).
    #[arg(long)]
    chapters_file: PathBuf,

    /// Directory holding model descriptor JSON and weight files (stands in
    /// for the real object store).
    #[arg(long)]
    object_store: PathBuf,

    /// Directory used to cache resolved artifacts on disk.
    #[arg(long)]
    cache_dir: PathBuf,

    /// Path to the signrt-worker binary.
    #[arg(long, default_value = "signrt-worker")]
    worker_bin: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(&args.log_level);
    tracing::info!(git_hash = env!("BUILD_GIT_HASH"), "starting signrt");

    let document_store = chapters::load(&args.chapters_file)?;
    let object_store = LocalObjectStore::new(&args.object_store);

    let mut config = ControllerConfig::from_env();
    config.worker_bin = args.worker_bin;

    let controller = FleetController::new(config, document_store, object_store, &args.cache_dir);

    let chapter_id = ChapterId::new(args.chapter);
    let result = controller.deploy(&chapter_id).await?;
    tracing::info!(chapter = %chapter_id, endpoints = ?result.endpoints, "deployed");
    for (lesson_id, endpoint) in &result.lesson_endpoints {
        println!("{lesson_id}\t{endpoint}");
    }

    run_until_interrupted(&controller).await;

    tracing::info!("shutting down workers");
    for status in controller.health() {
        controller.stop(&status.model_id).await;
    }

    Ok(())
}

async fn run_until_interrupted<D, O>(controller: &FleetController<D, O>)
where
    D: signrt_controller::DocumentStore,
    O: signrt_controller::ObjectStore,
{
    let mut health_tick = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received interrupt, stopping");
                return;
            }
            _ = health_tick.tick() => {
                for status in controller.health() {
                    tracing::debug!(model_id = %status.model_id, port = status.port, liveness = ?status.liveness, "health");
                }
            }
        }
    }
}

/// Installs a stderr layer for interactive use and a daily-rolling file layer
/// under the platform state directory, mirroring the fallback the rest of
/// this codebase uses for locating a writable home for runtime state. The
/// returned guard must be held for the process lifetime or buffered log
/// lines are dropped on exit.
fn init_tracing(log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/state")))
        .unwrap_or_else(std::env::temp_dir)
        .join("signrt");
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "signrt-cli.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    guard
}
