//! Destination resolution
//!
//! Pure functions of their inputs: no I/O. Output is deterministic for equal
//! inputs unless the policy's naming rules use time or random placeholders.

use std::sync::Arc;

use ferry_core::naming::join_path;
use ferry_core::{FileInfo, Owner, SaveDestination, StoragePolicy, UploadPolicyHint};

/// Policy in effect for an upload.
///
/// Authenticated owners use their bound policy. Anonymous uploads get a
/// best-effort remote policy derived from the request hint, or an empty one.
pub fn effective_policy(
    owner: Option<&Owner>,
    hint: Option<&UploadPolicyHint>,
) -> Arc<StoragePolicy> {
    match (owner, hint) {
        (Some(owner), _) => owner.policy.clone(),
        (None, Some(hint)) => Arc::new(StoragePolicy::from_hint(hint)),
        (None, None) => Arc::new(StoragePolicy::default()),
    }
}

/// Compute the backend-relative save path for a new upload.
///
/// Applies the directory rule then the file rule. Anonymous uploads use owner
/// id 0 and an empty virtual path.
pub fn resolve(policy: &StoragePolicy, owner: Option<&Owner>, file: &FileInfo) -> SaveDestination {
    let (owner_id, virtual_path) = match owner {
        Some(owner) => (owner.id, file.virtual_path.as_str()),
        None => (0, ""),
    };

    let dir = policy.generate_path(owner_id, virtual_path);
    let name = policy.generate_file_name(owner_id, &file.file_name);
    SaveDestination::new(join_path(&dir, &name))
}
