use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use refresharr_api::{build_router, config, services::HealthService, HealthState, MediaServersState};
use refresharr_media_scan::{
    ConfigStore, JsonFileConfigStore, MediaServerClient, RedisLockStore, RedisTaskStore,
    ScanCoordinator,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the CORS layer based on configuration.
///
/// In production mode:
/// - If `CORS_ORIGINS` is set, only those origins are allowed
/// - If `CORS_ORIGINS` is not set, CORS requests are rejected
///
/// In development mode, permissive CORS is used unless `CORS_ORIGINS` is set.
fn build_cors_layer(config: &config::Config) -> CorsLayer {
    let is_production = config.is_production();

    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                tracing::info!(
                    "CORS configured with {} allowed origin(s): {:?}",
                    allowed_origins.len(),
                    origins
                );
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
                    .max_age(std::time::Duration::from_secs(3600))
            }
        }
        _ if is_production => {
            tracing::warn!(
                "CORS_ORIGINS not configured in production mode. \
                 CORS requests will be rejected. Set CORS_ORIGINS to allow cross-origin requests."
            );
            CorsLayer::new()
        }
        _ => {
            tracing::warn!(
                "Using permissive CORS in development mode. \
                 Set CORS_ORIGINS for production-like behavior."
            );
            CorsLayer::permissive()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refresharr_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!(
        environment = %config.environment(),
        "Starting Refresharr API server on port {}",
        config.port
    );

    // Settings document
    let config_path = config.storage().config_path.clone();
    let config_store: Arc<dyn ConfigStore> = Arc::new(JsonFileConfigStore::new(&config_path));
    tracing::info!(path = %config_path.display(), "Settings document store initialized");

    // Redis task records and scan lock
    let redis_url = config.redis().connection_url();
    let redis_timeout = config.redis().connect_timeout();
    let task_store = RedisTaskStore::open(&redis_url, redis_timeout)?;
    let lock_store = RedisLockStore::open(&redis_url, redis_timeout)?;
    tracing::info!("Redis task and lock stores initialized");

    let coordinator = ScanCoordinator::new(
        config_store.clone(),
        Arc::new(task_store),
        Arc::new(lock_store),
        MediaServerClient::new()?,
    );

    let media_servers_state = MediaServersState::new(coordinator);
    let health_state = HealthState::new(
        redis_url,
        config_store,
        HealthService::new(redis_timeout),
    );

    let app = build_router(media_servers_state, health_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(build_cors_layer(&config)),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
