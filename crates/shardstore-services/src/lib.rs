//! Shardstore Services Library
//!
//! Placement and reconstruction of files across the backend pool: a write splits the
//! incoming stream into parts and uploads each to its own backend, a read stitches the
//! parts back together into one stream.

pub mod file_service;
pub mod reader;

pub use file_service::{FileDownload, FileService, FileServiceConfig, FileUpload, UploadBody};
pub use reader::{PartsReader, ReaderState};
