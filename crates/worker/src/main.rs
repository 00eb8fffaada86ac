// SPDX-License-Identifier: MIT

//! Worker process entry point. Spawned by the fleet controller with a port,
//! a model id, and local paths to the model's descriptor and weights. Prints
//! a `READY port=<port>` line to stdout once the listener is bound and the
//! classifier has completed a warm-up inference.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use signrt_core::{ModelDescriptor, SystemClock};
use signrt_worker::{
    Classifier, DenseSequenceClassifier, IdleShutdownTimer, SessionManager, WorkerConfig, WorkerError,
};

#[derive(Parser, Debug)]
#[command(name = "signrt-worker")]
struct Args {
    #[arg(long)]
    port: u16,

    #[arg(long = "model-id")]
    model_id: String,

    #[arg(long)]
    descriptor: PathBuf,

    #[arg(long)]
    weights: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "worker exiting with error");
        return Err(e.into());
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), WorkerError> {
    let descriptor_bytes = std::fs::read(&args.descriptor)
        .map_err(|e| WorkerError::DescriptorIo { path: args.descriptor.display().to_string(), source: e })?;
    let descriptor = ModelDescriptor::parse(&descriptor_bytes)
        .map_err(|e| WorkerError::DescriptorInvalid { path: args.descriptor.display().to_string(), source: e })?;

    tracing::info!(
        model_id = %args.model_id,
        sequence_length = descriptor.sequence_length,
        feature_dim = descriptor.feature_dim,
        labels = descriptor.labels.len(),
        "loaded descriptor"
    );

    let classifier = DenseSequenceClassifier::load(&args.weights, descriptor.feature_dim, descriptor.labels.clone())?;

    // Warm-up inference so the first real client request isn't the one paying
    // for any lazy initialization inside the classifier.
    let warmup = ndarray::Array2::zeros((descriptor.sequence_length, descriptor.feature_dim));
    let _ = classifier.predict(&warmup);

    let worker_config = WorkerConfig::from_env();
    let idle_timer = IdleShutdownTimer::new(SystemClock, worker_config.idle_timeout);
    let sessions = Arc::new(SessionManager::new(
        descriptor.sequence_length,
        worker_config.prediction_interval,
        worker_config.smoothing_window,
        Arc::new(classifier),
        idle_timer,
    ));

    println!("READY port={}", args.port);
    use std::io::Write;
    std::io::stdout().flush().ok();

    signrt_worker::server::serve(args.port, sessions).await
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
