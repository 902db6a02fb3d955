use crate::keys::validate_path;
use crate::traits::{PartBody, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;

/// Default capacity of an in-memory backend (100 MiB)
pub const DEFAULT_MEMORY_CAPACITY: u64 = 100 * 1024 * 1024;

/// Upper bound for the buffer reserved up front from a caller's size hint
const MAX_PREALLOCATION: u64 = 8 * 1024 * 1024;

struct MemoryState {
    blobs: HashMap<String, Bytes>,
    free: u64,
}

impl MemoryState {
    /// Free bytes once the blob currently stored under `path` (if any) is replaced.
    fn available_for(&self, path: &str) -> u64 {
        let reclaimed = self.blobs.get(path).map_or(0, |blob| blob.len() as u64);
        self.free + reclaimed
    }
}

/// In-memory backend store
///
/// Keeps every blob in a map guarded by a read/write lock. Concurrent downloads share
/// the read lock; uploads and deletes take the write lock only to swap the blob and
/// adjust the capacity counter.
pub struct InMemoryStorage {
    id: String,
    state: RwLock<MemoryState>,
}

impl InMemoryStorage {
    pub fn new(id: impl Into<String>, capacity: u64) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(MemoryState {
                blobs: HashMap::new(),
                free: capacity,
            }),
        }
    }

    pub fn with_default_capacity(id: impl Into<String>) -> Self {
        Self::new(id, DEFAULT_MEMORY_CAPACITY)
    }

    /// Number of blobs currently stored
    pub async fn blob_count(&self) -> usize {
        self.state.read().await.blobs.len()
    }

    fn capacity_exceeded(&self, requested: u64, available: u64) -> StorageError {
        StorageError::CapacityExceeded {
            backend: self.id.clone(),
            requested,
            available,
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn upload(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        size_hint: u64,
    ) -> StorageResult<u64> {
        validate_path(path)?;
        let start = std::time::Instant::now();

        {
            let state = self.state.read().await;
            let available = state.available_for(path);
            if size_hint > available {
                return Err(self.capacity_exceeded(size_hint, available));
            }
        }

        let mut data = Vec::with_capacity(size_hint.min(MAX_PREALLOCATION) as usize);
        reader.read_to_end(&mut data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read part body for {}: {}", path, e))
        })?;
        let size = data.len() as u64;

        let mut state = self.state.write().await;
        let available = state.available_for(path);
        if size > available {
            return Err(self.capacity_exceeded(size, available));
        }
        state.free = available - size;
        state.blobs.insert(path.to_string(), Bytes::from(data));

        tracing::info!(
            backend = %self.id,
            path = %path,
            size_bytes = size,
            free_bytes = state.free,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "In-memory part upload successful"
        );

        Ok(size)
    }

    async fn download(&self, path: &str) -> StorageResult<PartBody> {
        validate_path(path)?;

        let blob = self
            .state
            .read()
            .await
            .blobs
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{} on {}", path, self.id)))?;

        tracing::debug!(
            backend = %self.id,
            path = %path,
            size_bytes = blob.len(),
            "In-memory part opened for reading"
        );

        Ok(Box::pin(Cursor::new(blob)))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        validate_path(path)?;

        let mut state = self.state.write().await;
        if let Some(blob) = state.blobs.remove(path) {
            state.free += blob.len() as u64;
            tracing::info!(
                backend = %self.id,
                path = %path,
                size_bytes = blob.len(),
                free_bytes = state.free,
                "In-memory part deleted"
            );
        }

        Ok(())
    }

    async fn free_capacity(&self) -> StorageResult<u64> {
        Ok(self.state.read().await.free)
    }
}
