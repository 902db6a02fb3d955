//! Test helpers: a backend pool whose stores count their transfers, wired into a FileService.
//!
//! Run from workspace root: `cargo test -p shardstore-services`.

use async_trait::async_trait;
use shardstore_core::{ChunkingPolicy, FileMeta, FileRecord};
use shardstore_meta::{InMemoryMetadataStore, MetadataStore};
use shardstore_services::{FileDownload, FileService, FileServiceConfig};
use shardstore_storage::{
    BackendRegistry, InMemoryStorage, PartBody, Storage, StorageBackend, StorageResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

/// In-memory backend that records how often it was asked to move data
pub struct CountingStorage {
    inner: InMemoryStorage,
    uploads: AtomicUsize,
    downloads: AtomicUsize,
}

impl CountingStorage {
    pub fn new(id: &str, capacity: u64) -> Self {
        Self {
            inner: InMemoryStorage::new(id, capacity),
            uploads: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub async fn blob_count(&self) -> usize {
        self.inner.blob_count().await
    }
}

#[async_trait]
impl Storage for CountingStorage {
    fn identifier(&self) -> &str {
        self.inner.identifier()
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }

    async fn upload(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        size_hint: u64,
    ) -> StorageResult<u64> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.inner.upload(path, reader, size_hint).await
    }

    async fn download(&self, path: &str) -> StorageResult<PartBody> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.inner.download(path).await
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.inner.delete(path).await
    }

    async fn free_capacity(&self) -> StorageResult<u64> {
        self.inner.free_capacity().await
    }
}

/// A file service over `count` counting backends
pub struct TestPool {
    pub backends: Vec<Arc<CountingStorage>>,
    pub registry: Arc<BackendRegistry>,
    pub metadata: Arc<InMemoryMetadataStore>,
    pub service: FileService,
}

impl TestPool {
    pub fn total_downloads(&self) -> usize {
        self.backends.iter().map(|b| b.downloads()).sum()
    }

    pub fn total_uploads(&self) -> usize {
        self.backends.iter().map(|b| b.uploads()).sum()
    }

    pub async fn total_blobs(&self) -> usize {
        let mut total = 0;
        for backend in &self.backends {
            total += backend.blob_count().await;
        }
        total
    }

    /// Wait until the record stored for `name` belongs to a write other than `previous`
    pub async fn wait_for_new_write(
        &self,
        name: &str,
        previous: Option<&FileRecord>,
    ) -> FileRecord {
        loop {
            if let Ok(record) = self.metadata.fetch(name).await {
                if previous.map_or(true, |p| p.meta.write_id != record.meta.write_id) {
                    return record;
                }
            }
            tokio::task::yield_now().await;
        }
    }

    pub async fn free_capacities(&self) -> Vec<u64> {
        let mut free = Vec::new();
        for backend in &self.backends {
            free.push(backend.free_capacity().await.unwrap());
        }
        free
    }
}

pub async fn setup_pool_with(capacities: &[u64], config: FileServiceConfig) -> TestPool {
    let registry = Arc::new(BackendRegistry::new());
    let mut backends = Vec::new();
    for (index, capacity) in capacities.iter().enumerate() {
        let backend = Arc::new(CountingStorage::new(&format!("storage_{}", index), *capacity));
        registry.register(backend.clone()).await.unwrap();
        backends.push(backend);
    }

    let metadata = Arc::new(InMemoryMetadataStore::new());
    let service = FileService::new(registry.clone(), metadata.clone(), config);

    TestPool {
        backends,
        registry,
        metadata,
        service,
    }
}

/// Seven 1 MiB backends with the default placement settings
pub async fn setup_pool() -> TestPool {
    setup_pool_with(&[1024 * 1024; 7], FileServiceConfig::default()).await
}

pub fn config_with_policy(split_count: usize, min_chunk_size: u64) -> FileServiceConfig {
    FileServiceConfig {
        policy: ChunkingPolicy::new(split_count, min_chunk_size).unwrap(),
        ..FileServiceConfig::default()
    }
}

/// Deterministic, non-repeating-looking test content
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

pub async fn read_all(download: FileDownload) -> (FileMeta, Vec<u8>) {
    let FileDownload { meta, mut body } = download;
    let mut out = Vec::new();
    body.read_to_end(&mut out).await.unwrap();
    (meta, out)
}
