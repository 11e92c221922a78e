//! Shared test utilities for the Refresharr workspace
//!
//! Mock media servers for exercising refresh triggers without a real
//! Jellyfin or Plex instance. Used by the media-scan and api test suites.
//!
//! # Mock Services
//!
//! - [`MockJellyfinServer`] - `POST /Library/Refresh` with `api_key` query auth
//! - [`MockPlexServer`] - `GET /library/sections/{id}/refresh` with `X-Plex-Token`
//!
//! # Example
//!
//! ```rust,ignore
//! use refresharr_test_utils::{MockJellyfinServer, MockPlexServer};
//!
//! #[tokio::test]
//! async fn test_with_mocks() {
//!     let jellyfin = MockJellyfinServer::start().await;
//!     jellyfin.mock_refresh_success().await;
//!
//!     // Point the jellyfin settings at jellyfin.url()
//! }
//! ```

mod jellyfin;
mod plex;

pub use jellyfin::MockJellyfinServer;
pub use plex::MockPlexServer;

/// An address nothing listens on, for connection failure tests
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";
