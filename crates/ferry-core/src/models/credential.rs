use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time-bound authorization handed to a client for a direct-to-backend upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCredential {
    /// Opaque token the backend verifies
    pub token: String,
    /// Encoded upload policy, for backends that sign one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Presigned URL, for backends that accept direct PUTs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    /// Credential expiration time
    pub expires_at: DateTime<Utc>,
}

/// Correlation record stored in the shared cache under `callback_{token}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackSession {
    pub owner_id: u64,
    pub virtual_path: String,
}

impl CallbackSession {
    /// Cache key under which the session for `callback_key` lives.
    pub fn cache_key(callback_key: &str) -> String {
        format!("callback_{}", callback_key)
    }
}
