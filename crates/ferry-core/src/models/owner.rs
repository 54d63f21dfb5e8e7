use std::sync::Arc;

use super::policy::StoragePolicy;

/// Authenticated owner performing an upload
#[derive(Debug, Clone)]
pub struct Owner {
    pub id: u64,
    pub nick: String,
    /// Storage policy bound to this owner
    pub policy: Arc<StoragePolicy>,
}

impl Owner {
    pub fn new(id: u64, nick: impl Into<String>, policy: Arc<StoragePolicy>) -> Self {
        Self {
            id,
            nick: nick.into(),
            policy,
        }
    }
}
