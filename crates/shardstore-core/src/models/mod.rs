//! Domain models for file placement and backend status.

pub mod backend;
pub mod file;

pub use backend::BackendStatus;
pub use file::{FileMeta, FilePart, FileRecord, WriteStatus};
