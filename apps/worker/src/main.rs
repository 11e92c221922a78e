use std::sync::Arc;

use refresharr_media_scan::{
    ConfigStore, JsonFileConfigStore, MediaServerClient, RedisLockStore, RedisTaskStore,
    ScanCoordinator,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod jobs;

use config::Config;
use error::{WorkerError, WorkerResult};
use jobs::media_scan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refresharr_worker=debug,refresharr_media_scan=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            let err = WorkerError::Configuration(e.to_string());
            err.log();
            return Err(err.into());
        }
    };

    tracing::info!(environment = %config.environment(), "Starting Refresharr worker");

    if let Err(e) = run(config).await {
        e.log();
        return Err(e.into());
    }

    tracing::info!("Refresharr worker stopped");
    Ok(())
}

async fn run(config: Config) -> WorkerResult<()> {
    let config_path = config.storage().config_path.clone();
    let config_store: Arc<dyn ConfigStore> = Arc::new(JsonFileConfigStore::new(&config_path));
    tracing::info!(path = %config_path.display(), "Settings document store initialized");

    let redis_url = config.redis().connection_url();
    let redis_timeout = config.redis().connect_timeout();
    let task_store = RedisTaskStore::open(&redis_url, redis_timeout)?;
    let lock_store = RedisLockStore::open(&redis_url, redis_timeout)?;

    let client = MediaServerClient::new()?;
    let coordinator = Arc::new(ScanCoordinator::new(
        config_store,
        Arc::new(task_store),
        Arc::new(lock_store),
        client,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let queue_watch = tokio::spawn(media_scan::run_queue_watch(
        coordinator.clone(),
        config.queue_poll_interval(),
        shutdown_rx.clone(),
    ));
    let interval_schedule = tokio::spawn(media_scan::run_interval_schedule(
        coordinator,
        config.interval_tick(),
        shutdown_rx,
    ));

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| WorkerError::Internal(format!("failed to listen for shutdown: {e}")))?;
    tracing::info!("Shutdown requested");
    let _ = shutdown_tx.send(true);

    for handle in [queue_watch, interval_schedule] {
        handle
            .await
            .map_err(|e| WorkerError::Internal(format!("scan loop panicked: {e}")))??;
    }

    Ok(())
}
