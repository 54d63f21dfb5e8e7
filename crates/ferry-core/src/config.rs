//! Configuration module
//!
//! Process-level configuration for a ferry deployment: which storage policy
//! backs uploads and the raw upload settings handed to the settings store.

use std::collections::HashMap;
use std::env;

use crate::models::StoragePolicy;
use crate::settings::{CREDENTIAL_TIMEOUT_KEY, SESSION_TIMEOUT_KEY};
use crate::storage_types::PolicyKind;

/// Engine configuration resolved from the environment
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub policy: StoragePolicy,
    /// Raw settings (e.g. TTLs) exposed through a `StaticSettings` store
    pub settings: HashMap<String, String>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind: PolicyKind = lookup("FERRY_POLICY_TYPE")
            .unwrap_or_else(|| "local".to_string())
            .parse()?;

        let auto_rename = match lookup("FERRY_AUTO_RENAME") {
            Some(raw) => raw
                .parse::<bool>()
                .map_err(|_| anyhow::anyhow!("FERRY_AUTO_RENAME must be true or false"))?,
            None => false,
        };

        let max_size = match lookup("FERRY_MAX_SIZE") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("FERRY_MAX_SIZE must be a valid number"))?,
            None => 0,
        };

        let allowed_extensions = lookup("FERRY_ALLOWED_EXTENSIONS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let mut policy = StoragePolicy {
            id: 1,
            name: lookup("FERRY_POLICY_NAME").unwrap_or_else(|| "default".to_string()),
            kind,
            dir_name_rule: lookup("FERRY_DIR_NAME_RULE")
                .unwrap_or_else(|| "uploads/{uid}/{path}".to_string()),
            file_name_rule: lookup("FERRY_FILE_NAME_RULE")
                .unwrap_or_else(|| "{randomkey8}_{originname}".to_string()),
            auto_rename,
            max_size,
            allowed_extensions,
            ..Default::default()
        };

        match kind {
            PolicyKind::Local => {
                policy.base_path = Some(
                    lookup("FERRY_LOCAL_ROOT").unwrap_or_else(|| "./data/uploads".to_string()),
                );
            }
            PolicyKind::Remote => {
                policy.server = Some(lookup("FERRY_REMOTE_SERVER").ok_or_else(|| {
                    anyhow::anyhow!("FERRY_REMOTE_SERVER must be set for remote policies")
                })?);
                policy.secret_key = Some(lookup("FERRY_REMOTE_SECRET").ok_or_else(|| {
                    anyhow::anyhow!("FERRY_REMOTE_SECRET must be set for remote policies")
                })?);
            }
            PolicyKind::S3 => {
                policy.bucket_name = Some(lookup("FERRY_S3_BUCKET").ok_or_else(|| {
                    anyhow::anyhow!("FERRY_S3_BUCKET must be set for s3 policies")
                })?);
                policy.region = Some(lookup("FERRY_S3_REGION").ok_or_else(|| {
                    anyhow::anyhow!("FERRY_S3_REGION must be set for s3 policies")
                })?);
                policy.server = lookup("FERRY_S3_ENDPOINT");
            }
        }

        // Kept raw so malformed values surface at issuance time.
        let mut settings = HashMap::new();
        if let Some(raw) = lookup("FERRY_UPLOAD_CREDENTIAL_TIMEOUT") {
            settings.insert(CREDENTIAL_TIMEOUT_KEY.to_string(), raw);
        }
        if let Some(raw) = lookup("FERRY_UPLOAD_SESSION_TIMEOUT") {
            settings.insert(SESSION_TIMEOUT_KEY.to_string(), raw);
        }

        Ok(Self { policy, settings })
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind
    }
}
