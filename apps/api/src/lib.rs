//! Refresharr API library
//!
//! This module exposes the core API components for use in integration tests
//! and by the server binary.

pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use axum::{routing::get, Router};

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::{health_router, media_servers_router, HealthState, MediaServersState};

/// Assemble every route of the API
pub fn build_router(media_servers: MediaServersState, health: HealthState) -> Router {
    Router::new()
        .route("/", get(root))
        // Nested health routes: /health, /health/live, /health/ready
        .nest("/health", health_router(health))
        // Settings and scan routes: /mediaServers, /mediaServers/scan
        .merge(media_servers_router(media_servers))
}

async fn root() -> &'static str {
    "Refresharr - media server refresh coordinator"
}
