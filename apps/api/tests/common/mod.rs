//! Common test utilities for API integration tests
//!
//! Builds the full router over in-memory stores so routes can be exercised
//! with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use refresharr_api::{build_router, services::HealthService, HealthState, MediaServersState};
use refresharr_media_scan::{
    MediaServerClient, MemoryConfigStore, MemoryLockStore, MemoryTaskStore, ScanCoordinator,
};
use serde_json::Value;
use tower::ServiceExt;

pub use refresharr_test_utils::{MockJellyfinServer, MockPlexServer, UNREACHABLE_URL};

/// Full API router over `store`, with an empty task queue and a Redis URL
/// that never answers
pub fn test_app(store: MemoryConfigStore) -> Router {
    let coordinator = ScanCoordinator::new(
        Arc::new(store.clone()),
        Arc::new(MemoryTaskStore::default()),
        Arc::new(MemoryLockStore::new()),
        MediaServerClient::new().expect("http client"),
    );

    build_router(
        MediaServersState::new(coordinator),
        HealthState::new(
            "redis://127.0.0.1:9".to_string(),
            Arc::new(store),
            HealthService::new(Duration::from_millis(500)),
        ),
    )
}

/// Send one request and return the status with the body parsed as JSON
/// (`Value::Null` for an empty or non-JSON body)
pub async fn send(app: Router, method: Method, uri: &str, body: Option<Body>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request.body(body.unwrap_or_else(Body::empty)).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// JSON request body
pub fn json_body(value: &Value) -> Option<Body> {
    Some(Body::from(value.to_string()))
}
