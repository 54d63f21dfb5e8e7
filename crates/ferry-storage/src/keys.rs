//! Shared key conversion for storage handlers.
//!
//! Destinations are rooted paths (`/dir/file`); backend keys are the same
//! path without the leading `/`.

use ferry_core::SaveDestination;

use crate::traits::{StorageError, StorageResult};

/// Convert a save destination into a backend object key.
pub fn object_key(destination: &SaveDestination) -> StorageResult<String> {
    let key = destination.as_str().trim_start_matches('/');

    if key.is_empty() {
        return Err(StorageError::InvalidKey(
            "Storage key must not be empty".to_string(),
        ));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }

    Ok(key.to_string())
}
