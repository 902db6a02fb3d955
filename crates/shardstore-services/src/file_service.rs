use crate::reader::PartsReader;
use shardstore_core::{
    AppError, AppResult, ChunkingPolicy, Config, FileMeta, FilePart, FileRecord,
};
use shardstore_meta::MetadataStore;
use shardstore_storage::{BackendRegistry, Storage};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

/// Longest accepted file name, in bytes. Part paths append a 33 byte write suffix.
const MAX_FILE_NAME_LEN: usize = 200;

/// Source of the bytes of an upload
pub type UploadBody = Box<dyn AsyncRead + Send + Unpin>;

/// Placement settings of the file service
#[derive(Debug, Clone)]
pub struct FileServiceConfig {
    pub policy: ChunkingPolicy,
    pub max_upload_size_bytes: u64,
    /// Serve records whose write has not completed yet.
    pub allow_incomplete_reads: bool,
}

impl FileServiceConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: config.chunking_policy(),
            max_upload_size_bytes: config.max_upload_size_bytes,
            allow_incomplete_reads: config.allow_incomplete_reads,
        }
    }
}

impl Default for FileServiceConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A file to store: its name, declared length and a stream yielding exactly that many bytes
pub struct FileUpload {
    pub name: String,
    pub content_length: u64,
    pub body: UploadBody,
}

impl FileUpload {
    pub fn new(
        name: impl Into<String>,
        content_length: u64,
        body: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            content_length,
            body: Box::new(body),
        }
    }
}

/// A stored file opened for reading
pub struct FileDownload {
    pub meta: FileMeta,
    pub body: PartsReader,
}

/// Places files across the backend pool and reconstructs them on read
#[derive(Clone)]
pub struct FileService {
    registry: Arc<BackendRegistry>,
    metadata: Arc<dyn MetadataStore>,
    config: FileServiceConfig,
}

/// Reject names that cannot be used as a part path on every backend
fn validate_file_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::InvalidInput("File name is empty".to_string()));
    }
    if name.len() > MAX_FILE_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "File name exceeds {} bytes",
            MAX_FILE_NAME_LEN
        )));
    }
    if name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.chars().any(char::is_control)
    {
        return Err(AppError::InvalidInput(format!(
            "File name contains invalid characters: {}",
            name.escape_debug()
        )));
    }
    Ok(())
}

impl FileService {
    pub fn new(
        registry: Arc<BackendRegistry>,
        metadata: Arc<dyn MetadataStore>,
        config: FileServiceConfig,
    ) -> Self {
        Self {
            registry,
            metadata,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &FileServiceConfig {
        &self.config
    }

    /// Split `upload` into parts, store each part on its own backend and record the placement.
    ///
    /// Parts are uploaded one after another in order. The first error aborts the write and
    /// leaves the metadata record in progress; parts already stored stay where they are.
    /// Firing `cancel` drops the in-flight transfer and returns [`AppError::Cancelled`].
    ///
    /// Every write stores its parts under its own path, so rewriting a name never touches
    /// the parts of the write it replaces. Once the new record is in place the replaced
    /// parts are deleted. A write whose record was replaced or removed before it finished
    /// deletes its own parts and fails with [`AppError::Superseded`] or
    /// [`AppError::MetaNotFound`].
    #[tracing::instrument(
        skip(self, upload, cancel),
        fields(file = %upload.name, size_bytes = upload.content_length)
    )]
    pub async fn put_file(
        &self,
        upload: FileUpload,
        cancel: &CancellationToken,
    ) -> AppResult<FileMeta> {
        let FileUpload {
            name,
            content_length,
            mut body,
        } = upload;
        let start = Instant::now();

        validate_file_name(&name)?;
        if content_length == 0 {
            return Err(AppError::InvalidInput(
                "Content length must be greater than zero".to_string(),
            ));
        }
        if content_length > self.config.max_upload_size_bytes {
            return Err(AppError::InvalidInput(format!(
                "Content length {} exceeds the maximum upload size of {} bytes",
                content_length, self.config.max_upload_size_bytes
            )));
        }

        let sizes = self.config.policy.part_sizes(content_length)?;
        let backends = self.registry.select_for_write(sizes.len()).await?;

        let mut meta = FileMeta::new(&name, content_length);
        let path = meta.part_path();
        meta.parts = backends
            .iter()
            .zip(&sizes)
            .map(|(backend, size)| FilePart {
                backend_id: backend.identifier().to_string(),
                path: path.clone(),
                content_length: *size,
            })
            .collect();
        meta.validate()?;

        if cancel.is_cancelled() {
            return Err(cancelled(&name));
        }

        let replaced = self.metadata.begin_write(meta.clone()).await?;

        let outcome = match self.upload_parts(&meta, &backends, &mut body, cancel).await {
            Ok(()) => self.metadata.complete_write(&name, meta.write_id).await,
            Err(e) => Err(e),
        };

        // No record points at the replaced parts any more
        if let Some(replaced) = replaced {
            self.release_parts(&replaced.meta).await;
        }

        if let Err(e) = outcome {
            if !self.is_current_write(&meta).await {
                tracing::warn!(
                    file = %name,
                    write_id = %meta.write_id,
                    error = %e,
                    "Write lost its metadata record, deleting its parts"
                );
                self.release_parts(&meta).await;
            }
            return Err(e);
        }

        tracing::info!(
            file = %name,
            write_id = %meta.write_id,
            size_bytes = content_length,
            parts = meta.parts.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File stored"
        );

        Ok(meta)
    }

    async fn upload_parts(
        &self,
        meta: &FileMeta,
        backends: &[Arc<dyn Storage>],
        body: &mut UploadBody,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        for (index, (part, backend)) in meta.parts.iter().zip(backends).enumerate() {
            let part_start = Instant::now();
            let mut limited = (&mut *body).take(part.content_length);

            let written = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(file = %meta.name, part = index, "Upload cancelled");
                    return Err(cancelled(&meta.name));
                }
                result = backend.upload(&part.path, &mut limited, part.content_length) => {
                    result.map_err(|e| {
                        tracing::error!(
                            file = %meta.name,
                            part = index,
                            backend = %part.backend_id,
                            error = %e,
                            "Part upload failed"
                        );
                        AppError::from(e)
                    })?
                }
            };

            if written < part.content_length {
                return Err(AppError::TransferFailed(format!(
                    "source of {} ended after {} of {} bytes of part {}",
                    meta.name, written, part.content_length, index
                )));
            }

            tracing::debug!(
                file = %meta.name,
                part = index,
                backend = %part.backend_id,
                size_bytes = written,
                duration_ms = part_start.elapsed().as_secs_f64() * 1000.0,
                "Part stored"
            );
        }

        Ok(())
    }

    /// Whether the record stored for `meta.name` still belongs to this write
    async fn is_current_write(&self, meta: &FileMeta) -> bool {
        matches!(
            self.metadata.fetch(&meta.name).await,
            Ok(record) if record.meta.write_id == meta.write_id
        )
    }

    /// Delete every part of `meta`, returning the backends whose delete failed.
    ///
    /// Parts on backends that are no longer registered are skipped.
    async fn release_parts(&self, meta: &FileMeta) -> Vec<String> {
        let mut failed = Vec::new();

        for part in &meta.parts {
            let backend = match self.registry.lookup(&part.backend_id).await {
                Ok(backend) => backend,
                Err(e) => {
                    tracing::warn!(
                        file = %meta.name,
                        backend = %part.backend_id,
                        error = %e,
                        "Skipping part on unknown backend"
                    );
                    continue;
                }
            };

            if let Err(e) = backend.delete(&part.path).await {
                tracing::error!(
                    file = %meta.name,
                    backend = %part.backend_id,
                    path = %part.path,
                    error = %e,
                    "Failed to delete part"
                );
                failed.push(part.backend_id.clone());
            }
        }

        failed
    }

    /// Open a stored file for streaming.
    ///
    /// Only metadata is consulted here; no backend is contacted until the returned body is
    /// read. Records still being written are refused with [`AppError::IncompleteFile`]
    /// unless incomplete reads are allowed.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn get_file(&self, name: &str, cancel: &CancellationToken) -> AppResult<FileDownload> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled(format!("download of {} cancelled", name)));
        }

        let record = self.metadata.fetch(name).await?;

        if !record.is_complete() && !self.config.allow_incomplete_reads {
            tracing::debug!(file = %name, "Refusing read of file still being written");
            return Err(AppError::IncompleteFile(name.to_string()));
        }

        let body = PartsReader::new(
            self.registry.clone(),
            record.meta.parts.clone(),
            cancel.clone(),
        );

        Ok(FileDownload {
            meta: record.meta,
            body,
        })
    }

    /// Metadata record of a file, whatever its write status
    pub async fn stat(&self, name: &str) -> AppResult<FileRecord> {
        self.metadata.fetch(name).await
    }

    /// Remove a file's record, then delete each of its parts from its backend.
    ///
    /// Parts on backends that are no longer registered are skipped. Every part is
    /// attempted; if any deletion fails the call reports [`AppError::TransferFailed`]
    /// after the rest have been processed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_file(&self, name: &str) -> AppResult<FileMeta> {
        let record = self.metadata.remove(name).await?;
        let failed = self.release_parts(&record.meta).await;

        if !failed.is_empty() {
            return Err(AppError::TransferFailed(format!(
                "failed to delete parts of {} on {}",
                name,
                failed.join(", ")
            )));
        }

        tracing::info!(file = %name, parts = record.meta.parts.len(), "File deleted");
        Ok(record.meta)
    }
}

fn cancelled(name: &str) -> AppError {
    AppError::Cancelled(format!("upload of {} cancelled", name))
}
