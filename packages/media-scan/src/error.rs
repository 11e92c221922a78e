//! Error types for media server scan coordination
//!
//! The taxonomy follows what callers need to decide on a response:
//! validation failures reject a settings update, upstream failures come
//! from Jellyfin or Plex (HTTP status >= 400 or a network error), and
//! everything else is internal.

use thiserror::Error;

/// Settings failed validation; carries the user-facing message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The message shown to the caller
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors raised by the configuration, task and lock stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem access to the settings document failed
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON could not be parsed or written
    #[error("invalid stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Redis command failed
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Store did not answer in time
    #[error("{0} timed out")]
    Timeout(&'static str),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Main error type for scan coordination
#[derive(Error, Debug)]
pub enum ScanError {
    /// Media server settings are malformed
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Remote media server rejected the refresh or could not be reached
    #[error("{service} scan failed: {message}")]
    Upstream {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// Settings document could not be read or persisted
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Unexpected failure in orchestration
    #[error("internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// Upstream error for a remote status code >= 400
    pub fn upstream_status(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            status: Some(status),
            message: message.into(),
        }
    }

    /// Upstream error for a transport failure (timeout, refused, DNS)
    pub fn upstream_network(service: &'static str, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };

        Self::Upstream {
            service,
            status: None,
            message,
        }
    }

    /// Whether this error originated at a remote media server
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Whether this error is a rejected settings update
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;
