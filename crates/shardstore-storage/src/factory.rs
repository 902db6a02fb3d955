#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-memory")]
use crate::InMemoryStorage;
use crate::{BackendRegistry, Storage, StorageBackend, StorageError, StorageResult};
use shardstore_core::Config;
use std::sync::Arc;

/// Identifier of the backend at position `index` in the pool
pub fn backend_id(index: usize) -> String {
    format!("storage_{}", index)
}

/// Create a single backend store of the configured kind
async fn create_backend(config: &Config, index: usize) -> StorageResult<Arc<dyn Storage>> {
    let id = backend_id(index);

    match config.storage_backend {
        #[cfg(feature = "storage-memory")]
        StorageBackend::Memory => Ok(Arc::new(InMemoryStorage::new(
            id,
            config.backend_capacity_bytes,
        ))),

        #[cfg(not(feature = "storage-memory"))]
        StorageBackend::Memory => Err(StorageError::ConfigError(
            "In-memory storage backend not available (storage-memory feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.as_deref().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let dir = std::path::Path::new(base_path).join(&id);

            let storage = LocalStorage::new(id, dir, config.backend_capacity_bytes).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Build the configured backend pool (`storage_0` .. `storage_{n-1}`) and register
/// every backend in a fresh registry
pub async fn create_backends(config: &Config) -> StorageResult<BackendRegistry> {
    let registry = BackendRegistry::new();

    for index in 0..config.backend_count {
        let backend = create_backend(config, index).await?;
        registry
            .register(backend)
            .await
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
    }

    tracing::info!(
        backend_type = %config.storage_backend,
        backend_count = config.backend_count,
        capacity_bytes = config.backend_capacity_bytes,
        "Backend pool created"
    );

    Ok(registry)
}
