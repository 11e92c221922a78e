//! Mock Plex server for testing section refresh triggers
//!
//! Provides a [`MockPlexServer`] that answers
//! `GET /library/sections/{id}/refresh`, authenticated by the
//! `X-Plex-Token` header.

use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock Plex server
///
/// # Example
///
/// ```rust,ignore
/// use refresharr_test_utils::MockPlexServer;
///
/// #[tokio::test]
/// async fn test_refresh_sections() {
///     let server = MockPlexServer::start().await;
///     server.mock_section_refresh("1", 200).await;
///     server.mock_section_refresh("2", 200).await;
///
///     // Configure plex.url = server.url(), plex.apiKey = server.token(),
///     // plex.librarySectionIds = "1,2"
/// }
/// ```
pub struct MockPlexServer {
    server: MockServer,
    token: String,
}

impl MockPlexServer {
    /// Start a new mock Plex server with the default token
    pub async fn start() -> Self {
        Self::start_with_token("plex-test-token").await
    }

    /// Start a new mock Plex server with a custom token
    pub async fn start_with_token(token: &str) -> Self {
        Self {
            server: MockServer::start().await,
            token: token.to_string(),
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Get the Plex token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Expect exactly one refresh of `section`, answered with `status`
    pub async fn mock_section_refresh(&self, section: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/library/sections/{}/refresh", section)))
            .and(header("X-Plex-Token", self.token.as_str()))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Expect exactly one refresh of every section
    pub async fn mock_all_sections_refresh(&self) {
        self.mock_section_refresh("all", 200).await;
    }

    /// Answer every section refresh with `status`, any number of times
    pub async fn mock_any_section_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path_regex(r"^/library/sections/[^/]+/refresh$"))
            .and(header("X-Plex-Token", self.token.as_str()))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Fail the test on drop if any refresh is received
    pub async fn expect_no_refresh(&self) {
        Mock::given(method("GET"))
            .and(path_regex(r"^/library/sections/[^/]+/refresh$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .named("unexpected Plex refresh")
            .mount(&self.server)
            .await;
    }

    /// Paths requested so far, in order
    pub async fn requested_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_section_refresh_requires_token() {
        let server = MockPlexServer::start().await;
        server.mock_section_refresh("3", 200).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/library/sections/3/refresh", server.url()))
            .header("X-Plex-Token", server.token())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            server.requested_paths().await,
            vec!["/library/sections/3/refresh".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_not_matched() {
        let server = MockPlexServer::start().await;
        server.mock_any_section_status(200).await;

        let response = reqwest::get(format!("{}/library/sections/all/refresh", server.url()))
            .await
            .unwrap();

        // wiremock answers unmatched requests with 404
        assert_eq!(response.status().as_u16(), 404);
    }
}
