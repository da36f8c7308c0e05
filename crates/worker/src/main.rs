use anyhow::{Context, Result};
use venuewatch_worker::{init_tracing, log_filter_from_env, Worker, WorkerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    // RUST_LOG or LOG_LEVEL (default: venuewatch=info)
    init_tracing(&log_filter_from_env());

    if let Ok(path) = dotenv {
        tracing::info!("Loaded .env from {:?}", path);
    }

    tracing::info!("venuewatch-worker starting...");

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;

    tracing::info!(
        worker_id = %config.worker_id,
        decision_api_url = %config.decision_api_url,
        host_available = config.host_available,
        "Starting worker"
    );

    let worker = Worker::new(config).context("Failed to create worker")?;
    worker.start().context("Failed to start scheduler")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Received shutdown signal");

    if let Err(e) = worker.shutdown().await {
        tracing::error!(error = %e, "Worker shutdown did not complete cleanly");
        return Err(e.into());
    }

    tracing::info!("Worker shutdown complete");
    Ok(())
}
