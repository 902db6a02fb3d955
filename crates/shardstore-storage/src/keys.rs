//! Shared part path validation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Validate a part path before a backend touches it.
///
/// Paths are relative: they must not be empty, start with `/` or contain `..`.
/// All backends must apply the same rule so metadata stays portable between them.
pub fn validate_path(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::InvalidKey("Part path is empty".to_string()));
    }
    if path.contains("..") || path.starts_with('/') || path.contains('\0') {
        return Err(StorageError::InvalidKey(format!(
            "Part path contains invalid characters: {}",
            path
        )));
    }
    Ok(())
}
