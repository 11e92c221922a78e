//! Media server REST route handlers
//!
//! Provides endpoints for media server settings and manual scans:
//! - `GET /mediaServers` - Current settings merged onto defaults
//! - `POST|PUT /mediaServers` - Validate and replace the settings section
//! - `POST /mediaServers/scan` - Trigger Jellyfin and Plex now
//!
//! Every path also answers with a trailing slash.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use refresharr_media_scan::{MediaServerConfig, ScanCoordinator, ScanReport};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};

/// Shared application state for media server handlers
#[derive(Clone)]
pub struct MediaServersState {
    /// Scan coordinator
    pub coordinator: Arc<ScanCoordinator>,
}

impl MediaServersState {
    pub fn new(coordinator: ScanCoordinator) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
        }
    }
}

/// Create media server router (mounted at the root, paths are absolute)
pub fn media_servers_router(state: MediaServersState) -> Router {
    let settings = get(get_media_servers)
        .post(update_media_servers)
        .put(update_media_servers);

    Router::new()
        .route("/mediaServers", settings.clone())
        .route("/mediaServers/", settings)
        .route("/mediaServers/scan", post(trigger_scan))
        .route("/mediaServers/scan/", post(trigger_scan))
        .with_state(state)
}

/// Current media server settings
async fn get_media_servers(State(state): State<MediaServersState>) -> Json<MediaServerConfig> {
    Json(state.coordinator.media_server_config().await)
}

/// Replace the media server settings
///
/// # Response
/// - 200 OK with the merged settings
/// - 400 Bad Request if the body is not a JSON object or fails validation
/// - 500 Internal Server Error if the settings document cannot be written
async fn update_media_servers(
    State(state): State<MediaServersState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MediaServerConfig>> {
    let body = match body {
        Ok(Json(body @ Value::Object(_))) => body,
        Ok(_) => return Err(ApiError::InvalidBody("Invalid body".to_string())),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected media server settings body");
            return Err(ApiError::InvalidBody("Invalid body".to_string()));
        }
    };

    let merged = state.coordinator.update_media_server_config(body).await?;
    Ok(Json(merged))
}

/// Trigger a scan on both media servers
///
/// # Response
/// - 200 OK with `{jellyfin, plex, timestamp}`
/// - 502 Bad Gateway if a media server refused or could not be reached
/// - 500 Internal Server Error otherwise
async fn trigger_scan(State(state): State<MediaServersState>) -> ApiResult<Json<ScanReport>> {
    let report = state.coordinator.manual_scan().await?;
    Ok(Json(report))
}
