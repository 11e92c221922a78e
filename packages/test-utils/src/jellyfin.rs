//! Mock Jellyfin server for testing library refresh triggers
//!
//! Provides a [`MockJellyfinServer`] that answers `POST /Library/Refresh`
//! the way Jellyfin does, authenticated by the `api_key` query parameter.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REFRESH_PATH: &str = "/Library/Refresh";

/// Mock Jellyfin server
///
/// Wraps a [`wiremock::MockServer`]. Mocks mounted with an expected call
/// count are verified when the server is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use refresharr_test_utils::MockJellyfinServer;
///
/// #[tokio::test]
/// async fn test_refresh() {
///     let server = MockJellyfinServer::start().await;
///     server.mock_refresh_success().await;
///
///     // Configure jellyfin.url = server.url(), jellyfin.apiKey = server.api_key()
/// }
/// ```
pub struct MockJellyfinServer {
    server: MockServer,
    api_key: String,
}

impl MockJellyfinServer {
    /// Start a new mock Jellyfin server with the default API key
    pub async fn start() -> Self {
        Self::start_with_api_key("jellyfin-test-key").await
    }

    /// Start a new mock Jellyfin server with a custom API key
    pub async fn start_with_api_key(api_key: &str) -> Self {
        Self {
            server: MockServer::start().await,
            api_key: api_key.to_string(),
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Accept exactly one refresh with the configured key (204, like Jellyfin)
    pub async fn mock_refresh_success(&self) {
        self.mock_refresh_status(204, 1).await;
    }

    /// Answer refreshes with the configured key using `status`, expecting
    /// `times` calls
    pub async fn mock_refresh_status(&self, status: u16, times: u64) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(query_param("api_key", self.api_key.as_str()))
            .respond_with(ResponseTemplate::new(status))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Accept exactly one refresh, answering after `delay`
    pub async fn mock_slow_refresh(&self, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(query_param("api_key", self.api_key.as_str()))
            .respond_with(ResponseTemplate::new(204).set_delay(delay))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Reject refreshes that use `bad_api_key`
    pub async fn mock_auth_failure(&self, bad_api_key: &str) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(query_param("api_key", bad_api_key))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "Unauthorized"
            })))
            .mount(&self.server)
            .await;
    }

    /// Fail the test on drop if any refresh is received
    pub async fn expect_no_refresh(&self) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .named("unexpected Jellyfin refresh")
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
