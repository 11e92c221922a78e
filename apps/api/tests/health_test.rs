//! Integration tests for health check endpoints
//!
//! Tests the health check API routes to ensure proper responses
//! for liveness and readiness probes.

mod common;

use axum::{body::Body, http::Method, http::Request, http::StatusCode};
use common::*;
use refresharr_media_scan::MemoryConfigStore;
use tower::ServiceExt;

#[tokio::test]
async fn test_root_endpoint() {
    let app = test_app(MemoryConfigStore::empty());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();
    assert!(body_str.contains("Refresharr"));
}

#[tokio::test]
async fn test_simple_health_check() {
    let app = test_app(MemoryConfigStore::empty());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_liveness_probe() {
    let (status, body) = send(
        test_app(MemoryConfigStore::empty()),
        Method::GET,
        "/health/live",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
    assert!(body["version"].is_string());
}

/// Readiness fails while Redis is unreachable, but still reports the
/// settings document
#[tokio::test]
async fn test_readiness_without_redis() {
    let (status, body) = send(
        test_app(MemoryConfigStore::empty()),
        Method::GET,
        "/health/ready",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");

    let services = body["services"].as_array().unwrap();
    let redis = services.iter().find(|s| s["name"] == "redis").unwrap();
    let settings = services.iter().find(|s| s["name"] == "settings").unwrap();
    assert_eq!(redis["status"], "unhealthy");
    assert_eq!(settings["status"], "healthy");
}
