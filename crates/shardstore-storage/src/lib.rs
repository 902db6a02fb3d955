//! Shardstore Storage Library
//!
//! This crate provides the backend store abstraction, its in-memory and local
//! filesystem implementations, and the registry that ranks backends for placement.
//!
//! # Part paths
//!
//! Every backend addresses a stored part by a relative path. Paths must not be empty,
//! contain `..` or start with `/`. Validation is centralized in the `keys` module so
//! all backends accept the same set of paths.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod registry;
pub mod traits;

// Re-export commonly used types
pub use factory::create_backends;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::InMemoryStorage;
pub use registry::BackendRegistry;
pub use shardstore_core::StorageBackend;
pub use traits::{PartBody, Storage, StorageError, StorageResult};
