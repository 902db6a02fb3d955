//! Storage abstraction trait
//!
//! This module defines the Storage trait that all backend stores must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use shardstore_core::AppError;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Part not found: {0}")]
    NotFound(String),

    #[error("Invalid part path: {0}")]
    InvalidKey(String),

    #[error("Backend {backend} has {available} bytes free, {requested} bytes requested")]
    CapacityExceeded {
        backend: String,
        requested: u64,
        available: u64,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Readable body of one stored part. Dropping it closes the part.
pub type PartBody = Pin<Box<dyn AsyncRead + Send>>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CapacityExceeded {
                backend,
                requested,
                available,
            } => AppError::CapacityExceeded {
                backend,
                requested,
                available,
            },
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::TransferFailed(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// A backend store keeps opaque byte blobs addressed by path and accounts for its own
/// free capacity: only its `upload` and `delete` operations change the counter.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stable identifier used to reference this backend from file metadata
    fn identifier(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Store everything `reader` yields under `path` and return the number of bytes written.
    ///
    /// `size_hint` is the number of bytes the caller expects to send; backends use it to
    /// reject uploads that cannot fit before consuming the reader. Uploading to an existing
    /// path replaces the previous blob.
    async fn upload(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        size_hint: u64,
    ) -> StorageResult<u64>;

    /// Open the blob stored under `path` for reading
    async fn download(&self, path: &str) -> StorageResult<PartBody>;

    /// Delete the blob stored under `path`. Deleting a missing path succeeds.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Bytes this backend can still accept
    async fn free_capacity(&self) -> StorageResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_error_keeps_its_kind() {
        let err: AppError = StorageError::CapacityExceeded {
            backend: "storage_2".to_string(),
            requested: 10,
            available: 3,
        }
        .into();
        assert!(matches!(
            err,
            AppError::CapacityExceeded {
                requested: 10,
                available: 3,
                ..
            }
        ));
    }

    #[test]
    fn io_failures_become_transfer_failed() {
        let err: AppError = StorageError::NotFound("movie.mkv".to_string()).into();
        assert!(matches!(err, AppError::TransferFailed(_)));

        let err: AppError = StorageError::IoError(std::io::Error::other("disk gone")).into();
        assert!(matches!(err, AppError::TransferFailed(_)));
    }

    #[test]
    fn invalid_key_is_invalid_input() {
        let err: AppError = StorageError::InvalidKey("../etc/passwd".to_string()).into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
