//! Shardstore Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and the
//! chunking engine shared across all shardstore components.

pub mod chunking;
pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use chunking::{calculate_part_sizes, ChunkingPolicy};
pub use config::Config;
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use models::{BackendStatus, FileMeta, FilePart, FileRecord, WriteStatus};
pub use storage_types::StorageBackend;
// Note: Storage, StorageError, StorageResult live in the shardstore-storage crate
