//! Error handling for the Refresharr worker
//!
//! This module provides a unified error type using thiserror for the
//! background scan loops.

use refresharr_media_scan::{ScanError, StoreError};
use thiserror::Error;

/// Main worker error type
#[derive(Error, Debug)]
pub enum WorkerError {
    // ========== Configuration Errors ==========
    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    // ========== Store Errors ==========
    /// Redis or settings store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    // ========== Scan Errors ==========
    /// Scan setup or trigger failed
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    // ========== Job Processing Errors ==========
    /// Loop stopped before finishing (e.g., due to shutdown)
    #[error("job cancelled: {0}")]
    Cancelled(String),

    // ========== Internal Errors ==========
    /// Internal error (catch-all)
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(_) => true,
            Self::Scan(e) => e.is_upstream(),
            _ => false,
        }
    }

    /// Get a severity level for logging
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Critical errors that should alert operators
            Self::Configuration(_) => ErrorSeverity::Critical,

            // Errors that indicate service issues
            Self::Store(_) | Self::Internal(_) => ErrorSeverity::Error,

            // Warnings for expected failures
            Self::Scan(_) | Self::Cancelled(_) => ErrorSeverity::Warning,
        }
    }

    /// Log the error with appropriate severity
    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Critical => {
                tracing::error!(
                    error = %self,
                    retryable = self.is_retryable(),
                    "Critical worker error"
                );
            }
            ErrorSeverity::Error => {
                tracing::error!(
                    error = %self,
                    retryable = self.is_retryable(),
                    "Worker error"
                );
            }
            ErrorSeverity::Warning => {
                tracing::warn!(
                    error = %self,
                    retryable = self.is_retryable(),
                    "Worker warning"
                );
            }
        }
    }
}

/// Error severity levels for logging and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical errors that should trigger alerts
    Critical,
    /// Standard errors
    Error,
    /// Warnings for expected failures
    Warning,
}

/// Result type alias for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

// ========== Conversion Implementations ==========

impl From<anyhow::Error> for WorkerError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to WorkerError first
        match err.downcast::<WorkerError>() {
            Ok(worker_err) => worker_err,
            Err(err) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(WorkerError::Store(StoreError::Timeout("redis connection")).is_retryable());
        assert!(WorkerError::Scan(ScanError::upstream_status("Plex", 503, "503")).is_retryable());

        assert!(!WorkerError::Configuration("bad".to_string()).is_retryable());
        assert!(!WorkerError::Scan(ScanError::Internal("x".to_string())).is_retryable());
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(
            WorkerError::Configuration("test".to_string()).severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            WorkerError::Store(StoreError::Timeout("redis connection")).severity(),
            ErrorSeverity::Error
        );
        assert_eq!(
            WorkerError::Cancelled("shutdown".to_string()).severity(),
            ErrorSeverity::Warning
        );
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: WorkerError =
            anyhow::Error::new(WorkerError::Configuration("x".to_string())).into();
        assert!(matches!(err, WorkerError::Configuration(_)));

        let err: WorkerError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, WorkerError::Internal(_)));
    }
}
