//! Error handling for the Refresharr API
//!
//! This module provides a unified error type using thiserror, with
//! automatic HTTP status code mapping via Axum's IntoResponse trait.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use refresharr_media_scan::ScanError;
use serde::Serialize;
use thiserror::Error;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Main API error type
#[derive(Error, Debug)]
pub enum ApiError {
    // ========== Validation Errors ==========
    /// Media server settings were rejected
    #[error("{0}")]
    ValidationError(String),

    /// Request body is not a JSON object
    #[error("{0}")]
    InvalidBody(String),

    // ========== External Service Errors ==========
    /// Jellyfin or Plex refused the refresh or could not be reached
    #[error("{service} scan failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    // ========== Storage Errors ==========
    /// Settings document could not be read or written
    #[error("storage error: {0}")]
    Storage(String),

    // ========== Internal Errors ==========
    /// Internal server error (catch-all for unexpected errors)
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            Self::ValidationError(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,

            // 502 Bad Gateway (media server errors)
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Log the error with appropriate severity based on status code
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Client error"
            );
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let error_response = ErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

// ========== Conversion Implementations ==========

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Validation(e) => Self::ValidationError(e.0),
            ScanError::Upstream {
                service, message, ..
            } => Self::Upstream { service, message },
            ScanError::Store(e) => Self::Storage(e.to_string()),
            ScanError::Internal(message) => Self::Internal(message),
        }
    }
}
