use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::naming;
use crate::storage_types::PolicyKind;

/// Named storage policy describing a backend and its naming rules
///
/// Policies are immutable for the lifetime of an upload and shared
/// read-only (usually behind an `Arc`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePolicy {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PolicyKind,
    /// Remote server URL or S3-compatible endpoint
    #[serde(default)]
    pub server: Option<String>,
    /// Root directory for local policies
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Shared secret used to sign remote credentials
    #[serde(default, skip_serializing)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub dir_name_rule: String,
    #[serde(default)]
    pub file_name_rule: String,
    #[serde(default)]
    pub auto_rename: bool,
    /// Maximum single file size in bytes, 0 means unlimited
    #[serde(default)]
    pub max_size: u64,
    /// Allowed extensions without leading dot, empty means all
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl StoragePolicy {
    /// Best-effort policy for anonymous uploads, built from a request hint.
    pub fn from_hint(hint: &UploadPolicyHint) -> Self {
        Self {
            kind: PolicyKind::Remote,
            dir_name_rule: hint.save_path.clone(),
            file_name_rule: hint.file_name.clone(),
            auto_rename: hint.auto_rename,
            max_size: hint.max_size,
            allowed_extensions: hint.allowed_extensions.clone(),
            ..Default::default()
        }
    }

    /// Expand the directory naming rule.
    pub fn generate_path(&self, owner_id: u64, virtual_path: &str) -> String {
        let mut table = naming::base_replacements(owner_id);
        table.push(("{path}", format!("{}/", virtual_path)));
        naming::clean_path(&naming::expand(&self.dir_name_rule, &table))
    }

    /// Expand the file naming rule; without auto-rename the original name is kept.
    pub fn generate_file_name(&self, owner_id: u64, origin: &str) -> String {
        if !self.auto_rename {
            return origin.to_string();
        }

        let mut table = naming::base_replacements(owner_id);
        table.push(("{originname}", origin.to_string()));
        table.push(("{uuid}", Uuid::new_v4().to_string()));
        naming::expand(&self.file_name_rule, &table)
    }

    /// Check a file extension against the allow list.
    pub fn is_extension_allowed(&self, file_name: &str) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }

        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// Caller-declared upload policy carried with anonymous (delegated) uploads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicyHint {
    #[serde(default)]
    pub save_path: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub auto_rename: bool,
    #[serde(default)]
    pub max_size: u64,
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_key: Option<String>,
}
