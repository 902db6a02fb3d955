//! File placement models: parts, logical file metadata and its write lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// One contiguous shard of a file, stored on exactly one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePart {
    pub backend_id: String,
    pub path: String,
    pub content_length: u64,
}

/// Logical record of a file. Part order defines reconstruction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    /// Identifies one write of `name`. Two writes of the same name never share an id.
    pub write_id: Uuid,
    pub parts: Vec<FilePart>,
    pub content_length: u64,
}

impl FileMeta {
    /// Metadata for a new write of a file whose parts are not assigned yet.
    pub fn new(name: impl Into<String>, content_length: u64) -> Self {
        Self {
            name: name.into(),
            write_id: Uuid::new_v4(),
            parts: Vec::new(),
            content_length,
        }
    }

    /// Backend path of this write's parts, distinct for every write of the same name
    pub fn part_path(&self) -> String {
        format!("{}.{}", self.name, self.write_id.simple())
    }

    pub fn parts_total(&self) -> u64 {
        self.parts.iter().map(|part| part.content_length).sum()
    }

    /// Check that the part lengths add up to the declared content length.
    pub fn validate(&self) -> AppResult<()> {
        let total = self.parts_total();
        if total != self.content_length {
            return Err(AppError::Internal(format!(
                "parts of {} sum to {} bytes, expected {}",
                self.name, total, self.content_length
            )));
        }
        Ok(())
    }
}

/// Lifecycle flag of a metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    InProgress,
    Complete,
}

/// What the metadata store keeps per file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub meta: FileMeta,
    pub status: WriteStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn in_progress(meta: FileMeta) -> Self {
        Self {
            meta,
            status: WriteStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn mark_complete(&mut self) {
        self.status = WriteStatus::Complete;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_complete(&self) -> bool {
        self.status == WriteStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(backend: &str, len: u64) -> FilePart {
        FilePart {
            backend_id: backend.to_string(),
            path: "movie.mkv".to_string(),
            content_length: len,
        }
    }

    #[test]
    fn validate_accepts_matching_parts() {
        let mut meta = FileMeta::new("movie.mkv", 30);
        meta.parts = vec![part("storage_0", 20), part("storage_1", 10)];
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn validate_rejects_mismatched_parts() {
        let mut meta = FileMeta::new("movie.mkv", 31);
        meta.parts = vec![part("storage_0", 20), part("storage_1", 10)];
        assert!(matches!(meta.validate(), Err(AppError::Internal(_))));
    }

    #[test]
    fn each_write_gets_its_own_part_path() {
        let first = FileMeta::new("movie.mkv", 30);
        let second = FileMeta::new("movie.mkv", 30);
        assert_ne!(first.write_id, second.write_id);
        assert_ne!(first.part_path(), second.part_path());
        assert!(first.part_path().starts_with("movie.mkv."));
        assert_eq!(first.part_path().len(), "movie.mkv.".len() + 32);
    }

    #[test]
    fn record_lifecycle() {
        let mut record = FileRecord::in_progress(FileMeta::new("a", 0));
        assert!(!record.is_complete());
        assert!(record.completed_at.is_none());

        record.mark_complete();
        assert!(record.is_complete());
        assert!(record.completed_at.unwrap() >= record.started_at);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&WriteStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
