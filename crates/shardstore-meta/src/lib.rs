//! Shardstore Metadata Library
//!
//! This crate holds the file placement records: which parts make up a file, where
//! each part lives and whether its write has finished.

pub mod memory;
pub mod store;

// Re-export commonly used types
pub use memory::InMemoryMetadataStore;
pub use store::MetadataStore;
