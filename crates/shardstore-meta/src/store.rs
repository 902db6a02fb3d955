use async_trait::async_trait;
use shardstore_core::{AppResult, FileMeta, FileRecord};
use uuid::Uuid;

/// Trait for file metadata operations
///
/// Records are keyed by file name. Implementations must be safe to share between
/// concurrent requests and must let a caller observe its own writes immediately.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Store `meta` as an in-progress record, replacing any record with the same name.
    ///
    /// Returns the replaced record, whose parts are no longer referenced by any record.
    async fn begin_write(&self, meta: FileMeta) -> AppResult<Option<FileRecord>>;

    /// Mark the record for `name` complete if it still belongs to write `write_id`.
    ///
    /// `MetaNotFound` if there is no record, `Superseded` if a later `begin_write`
    /// replaced it. Neither case changes the stored record.
    async fn complete_write(&self, name: &str, write_id: Uuid) -> AppResult<()>;

    /// Return the record for `name` whatever its status. `MetaNotFound` if there is none.
    async fn fetch(&self, name: &str) -> AppResult<FileRecord>;

    /// Delete and return the record for `name`. `MetaNotFound` if there is none.
    async fn remove(&self, name: &str) -> AppResult<FileRecord>;
}
