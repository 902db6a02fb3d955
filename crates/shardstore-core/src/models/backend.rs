//! Point-in-time view of a storage backend.

use serde::{Deserialize, Serialize};

use crate::storage_types::StorageBackend;

/// Identifier, kind and free capacity of one registered backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub id: String,
    pub backend: StorageBackend,
    /// Free capacity in bytes, `None` when the backend could not report it.
    pub free_capacity: Option<u64>,
}
