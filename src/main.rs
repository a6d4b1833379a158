use anyhow::Context;
use camscan::{
    setup_logging, BatchScheduler, CandidateGenerator, CandidateWorker, Cli, ConfigProvider,
    FileConfigProvider, HttpStreamDecoder, JsonLinesSink, ScanStatistics, Validator,
};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    setup_logging(args.verbose).map_err(|e| anyhow::anyhow!("failed to set up logging: {e}"))?;

    info!("Starting camscan v{}", env!("CARGO_PKG_VERSION"));

    // Configuration problems are fatal before the first probe.
    let provider = FileConfigProvider::load(&args.config, args.overrides())
        .await
        .with_context(|| format!("loading {}", args.config.display()))?;
    let config = provider.snapshot();

    let decoder = Arc::new(HttpStreamDecoder::new(&config.timeouts)?);
    let validator = Arc::new(Validator::new(&config.timeouts, decoder)?);
    let sink = Arc::new(JsonLinesSink::new(&config.results_path));
    info!("Saving validated cameras to {}", sink.path().display());

    let stats = Arc::new(ScanStatistics::new());
    let worker = CandidateWorker::new(validator, sink, stats);
    let mut scheduler = BatchScheduler::new(Arc::new(provider), CandidateGenerator::new(), worker);

    let result = tokio::select! {
        result = scheduler.run() => result,
        _ = shutdown_signal() => {
            info!("Received shutdown signal");
            Ok(())
        }
    };

    info!("Shutting down...");
    scheduler.shutdown().await;

    if let Err(e) = result {
        error!("Scan stopped: {}", e);
        return Err(e.into());
    }

    info!("camscan stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Failed to create SIGTERM handler: {}", e);
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => info!("Received SIGINT"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
