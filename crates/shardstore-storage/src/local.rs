use crate::keys::validate_path;
use crate::traits::{PartBody, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;

/// Suffix of the temporary file a part is streamed into before it replaces the target
const UPLOAD_SUFFIX: &str = ".upload";

/// Local filesystem backend store
///
/// Each instance owns one directory. Free capacity is a quota minus the bytes stored
/// under that directory; the usage counter is rebuilt from disk when the backend is
/// opened and kept in memory afterwards.
pub struct LocalStorage {
    id: String,
    base_path: PathBuf,
    capacity: u64,
    used: Mutex<u64>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `id` - Backend identifier recorded in file metadata (e.g., "storage_0")
    /// * `base_path` - Root directory for this backend's parts (e.g., "/var/lib/shardstore/storage_0")
    /// * `capacity` - Quota in bytes
    pub async fn new(
        id: impl Into<String>,
        base_path: impl Into<PathBuf>,
        capacity: u64,
    ) -> StorageResult<Self> {
        let id = id.into();
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let used = directory_size(&base_path).await?;

        tracing::info!(
            backend = %id,
            path = %base_path.display(),
            capacity_bytes = capacity,
            used_bytes = used,
            "Local storage backend opened"
        );

        Ok(LocalStorage {
            id,
            base_path,
            capacity,
            used: Mutex::new(used),
        })
    }

    /// Convert a part path to a filesystem path with security validation
    ///
    /// This function validates that the part path doesn't contain traversal sequences
    /// that could escape the backend directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_path(key)?;

        let path = self.base_path.join(key);

        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Part path resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn capacity_exceeded(&self, requested: u64, available: u64) -> StorageError {
        StorageError::CapacityExceeded {
            backend: self.id.clone(),
            requested,
            available,
        }
    }

    async fn release(&self, bytes: u64) {
        let mut used = self.used.lock().await;
        *used = used.saturating_sub(bytes);
    }
}

/// Total size of the regular files below `root`
async fn directory_size(root: &Path) -> StorageResult<u64> {
    let mut total = 0u64;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                total += entry.metadata().await?.len();
            }
        }
    }

    Ok(total)
}

async fn existing_len(path: &Path) -> u64 {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => 0,
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    async fn upload(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        size_hint: u64,
    ) -> StorageResult<u64> {
        let target = self.key_to_path(path)?;
        let start = std::time::Instant::now();
        let replaced = existing_len(&target).await;

        // Reserve the hinted size so concurrent uploads cannot overcommit the quota
        {
            let mut used = self.used.lock().await;
            let available = self.capacity.saturating_sub(*used) + replaced;
            if size_hint > available {
                return Err(self.capacity_exceeded(size_hint, available));
            }
            *used += size_hint;
        }

        let mut staging = target.clone().into_os_string();
        staging.push(UPLOAD_SUFFIX);
        let staging = PathBuf::from(staging);

        let written = match self.write_staging(&staging, reader).await {
            Ok(written) => written,
            Err(e) => {
                self.release(size_hint).await;
                let _ = fs::remove_file(&staging).await;
                return Err(e);
            }
        };

        {
            let mut used = self.used.lock().await;
            let without_reservation = used.saturating_sub(size_hint);
            let available = self.capacity.saturating_sub(without_reservation) + replaced;
            if written > available {
                *used = without_reservation;
                drop(used);
                let _ = fs::remove_file(&staging).await;
                return Err(self.capacity_exceeded(written, available));
            }
            *used = without_reservation.saturating_sub(replaced) + written;
        }

        if let Err(e) = fs::rename(&staging, &target).await {
            self.release(written).await;
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to move part into place at {}: {}",
                target.display(),
                e
            )));
        }

        tracing::info!(
            backend = %self.id,
            path = %target.display(),
            key = %path,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage part upload successful"
        );

        Ok(written)
    }

    async fn download(&self, path: &str) -> StorageResult<PartBody> {
        let target = self.key_to_path(path)?;

        if !fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{} on {}", path, self.id)));
        }

        let file = fs::File::open(&target).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to open file {}: {}",
                target.display(),
                e
            ))
        })?;

        tracing::debug!(
            backend = %self.id,
            path = %target.display(),
            "Local storage part opened for reading"
        );

        Ok(Box::pin(file))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let target = self.key_to_path(path)?;
        let start = std::time::Instant::now();

        let size = existing_len(&target).await;
        if !fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&target).await.map_err(|e| {
            StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                target.display(),
                e
            ))
        })?;
        self.release(size).await;

        tracing::info!(
            backend = %self.id,
            path = %target.display(),
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage part delete successful"
        );

        Ok(())
    }

    async fn free_capacity(&self) -> StorageResult<u64> {
        let used = *self.used.lock().await;
        Ok(self.capacity.saturating_sub(used))
    }
}

impl LocalStorage {
    async fn write_staging(
        &self,
        staging: &Path,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        self.ensure_parent_dir(staging).await?;

        let mut file = fs::File::create(staging).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                staging.display(),
                e
            ))
        })?;

        let written = tokio::io::copy(reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                staging.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                staging.display(),
                e
            ))
        })?;

        Ok(written)
    }
}
