//! Error types module
//!
//! All failures surfaced by the placement and reconstruction core are unified under
//! the `AppError` enum. Backend adapters keep their own error type and convert into
//! `AppError` at the crate boundary, so callers always receive a distinguishable kind
//! rather than a raw transport error.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like exhausted capacity
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "META_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the whole operation can succeed
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient backends: {requested} requested, {available} available")]
    InsufficientBackends { requested: usize, available: usize },

    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    #[error("Backend already registered: {0}")]
    DuplicateBackend(String),

    #[error("File metadata not found: {0}")]
    MetaNotFound(String),

    #[error("Capacity exceeded on backend {backend}: {requested} bytes requested, {available} bytes free")]
    CapacityExceeded {
        backend: String,
        requested: u64,
        available: u64,
    },

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("File write still in progress: {0}")]
    IncompleteFile(String),

    #[error("Write superseded by a newer write of {0}")]
    Superseded(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for core operations
pub type AppResult<T> = Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::TransferFailed(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, false, LogLevel::Debug),
        AppError::InsufficientBackends { .. } => (
            503,
            "INSUFFICIENT_BACKENDS",
            true,
            false,
            LogLevel::Warn,
        ),
        AppError::BackendNotFound(_) => (500, "BACKEND_NOT_FOUND", false, true, LogLevel::Error),
        AppError::DuplicateBackend(_) => (409, "DUPLICATE_BACKEND", false, false, LogLevel::Warn),
        AppError::MetaNotFound(_) => (404, "META_NOT_FOUND", false, false, LogLevel::Debug),
        AppError::CapacityExceeded { .. } => {
            (507, "CAPACITY_EXCEEDED", true, false, LogLevel::Warn)
        }
        AppError::TransferFailed(_) => (502, "TRANSFER_FAILED", true, true, LogLevel::Error),
        AppError::IncompleteFile(_) => (409, "INCOMPLETE_FILE", true, false, LogLevel::Debug),
        AppError::Superseded(_) => (409, "WRITE_SUPERSEDED", false, false, LogLevel::Warn),
        AppError::Cancelled(_) => (499, "CANCELLED", true, false, LogLevel::Debug),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::InsufficientBackends { .. } => "InsufficientBackends",
            AppError::BackendNotFound(_) => "BackendNotFound",
            AppError::DuplicateBackend(_) => "DuplicateBackend",
            AppError::MetaNotFound(_) => "MetaNotFound",
            AppError::CapacityExceeded { .. } => "CapacityExceeded",
            AppError::TransferFailed(_) => "TransferFailed",
            AppError::IncompleteFile(_) => "IncompleteFile",
            AppError::Superseded(_) => "Superseded",
            AppError::Cancelled(_) => "Cancelled",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::InsufficientBackends {
                requested,
                available,
            } => format!(
                "Not enough storage backends: {} requested, {} available",
                requested, available
            ),
            AppError::BackendNotFound(_) => "Storage backend unavailable".to_string(),
            AppError::DuplicateBackend(ref id) => format!("Backend {} already registered", id),
            AppError::MetaNotFound(ref name) => format!("File {} not found", name),
            AppError::CapacityExceeded {
                requested,
                available,
                ..
            } => format!(
                "Storage backend is full: {} bytes requested, {} bytes free",
                requested, available
            ),
            AppError::TransferFailed(_) => "Failed to transfer file data".to_string(),
            AppError::IncompleteFile(ref name) => {
                format!("File {} is still being written", name)
            }
            AppError::Superseded(ref name) => {
                format!("A newer write of {} replaced this one", name)
            }
            AppError::Cancelled(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_meta_not_found() {
        let err = AppError::MetaNotFound("report.pdf".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "META_NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "File report.pdf not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_capacity_exceeded() {
        let err = AppError::CapacityExceeded {
            backend: "storage_1".to_string(),
            requested: 2000,
            available: 1000,
        };
        assert_eq!(err.http_status_code(), 507);
        assert_eq!(err.error_code(), "CAPACITY_EXCEEDED");
        assert!(err.is_recoverable());
        assert!(err.client_message().contains("2000"));
        assert!(err.client_message().contains("1000"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_transfer_failed_is_sensitive() {
        let err = AppError::TransferFailed("connection reset by storage_3".to_string());
        assert_eq!(err.http_status_code(), 502);
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Failed to transfer file data");
        assert!(err.to_string().contains("storage_3"));
    }

    #[test]
    fn test_insufficient_backends_message() {
        let err = AppError::InsufficientBackends {
            requested: 5,
            available: 2,
        };
        assert_eq!(err.error_type(), "InsufficientBackends");
        assert_eq!(
            err.to_string(),
            "Insufficient backends: 5 requested, 2 available"
        );
    }

    #[test]
    fn test_superseded_write_is_conflict() {
        let err = AppError::Superseded("same.bin".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "WRITE_SUPERSEDED");
        assert!(!err.is_recoverable());
        assert_eq!(err.error_type(), "Superseded");
    }

    #[test]
    fn test_io_error_becomes_transfer_failed() {
        let err = AppError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert!(matches!(err, AppError::TransferFailed(_)));
    }
}
