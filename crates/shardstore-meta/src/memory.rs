use crate::store::MetadataStore;
use async_trait::async_trait;
use shardstore_core::{AppError, AppResult, FileMeta, FileRecord};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Metadata store backed by a map in process memory
#[derive(Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<String, FileRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, in any state
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    #[tracing::instrument(
        skip(self, meta),
        fields(file = %meta.name, write_id = %meta.write_id, parts = meta.parts.len())
    )]
    async fn begin_write(&self, meta: FileMeta) -> AppResult<Option<FileRecord>> {
        let name = meta.name.clone();
        let previous = self
            .records
            .write()
            .await
            .insert(name, FileRecord::in_progress(meta));

        if let Some(previous) = &previous {
            tracing::debug!(
                replaced_write_id = %previous.meta.write_id,
                replaced_status = ?previous.status,
                "Replaced existing metadata record"
            );
        }
        Ok(previous)
    }

    #[tracing::instrument(skip(self))]
    async fn complete_write(&self, name: &str, write_id: Uuid) -> AppResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(name)
            .ok_or_else(|| AppError::MetaNotFound(name.to_string()))?;

        if record.meta.write_id != write_id {
            tracing::debug!(
                current_write_id = %record.meta.write_id,
                "Record belongs to a newer write"
            );
            return Err(AppError::Superseded(name.to_string()));
        }

        record.mark_complete();
        Ok(())
    }

    async fn fetch(&self, name: &str) -> AppResult<FileRecord> {
        self.records
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::MetaNotFound(name.to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, name: &str) -> AppResult<FileRecord> {
        self.records
            .write()
            .await
            .remove(name)
            .ok_or_else(|| AppError::MetaNotFound(name.to_string()))
    }
}
