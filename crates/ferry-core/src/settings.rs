//! Settings store access and upload TTL resolution

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::UploadError;

/// Setting name for the delegated credential lifetime (seconds)
pub const CREDENTIAL_TIMEOUT_KEY: &str = "upload_credential_timeout";
/// Setting name for the callback session lifetime (seconds)
pub const SESSION_TIMEOUT_KEY: &str = "upload_session_timeout";

const DEFAULT_CREDENTIAL_TTL_SECS: u64 = 3600;
const DEFAULT_SESSION_TTL_SECS: u64 = 86400;

/// Read access to the external settings store
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the given settings; missing names are simply absent from the map.
    async fn get_by_names(&self, names: &[&str]) -> HashMap<String, String>;
}

/// In-memory settings store
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SettingsStore for StaticSettings {
    async fn get_by_names(&self, names: &[&str]) -> HashMap<String, String> {
        names
            .iter()
            .filter_map(|name| {
                self.values
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect()
    }
}

/// Lifetimes used when issuing a delegated upload credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTtls {
    pub credential_secs: u64,
    pub session_secs: u64,
}

impl Default for UploadTtls {
    fn default() -> Self {
        Self {
            credential_secs: DEFAULT_CREDENTIAL_TTL_SECS,
            session_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl UploadTtls {
    /// Names to request from the settings store.
    pub const SETTING_NAMES: [&'static str; 2] = [CREDENTIAL_TIMEOUT_KEY, SESSION_TIMEOUT_KEY];

    /// Resolve TTLs from raw settings. Missing keys use defaults; malformed ones are fatal.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self, UploadError> {
        let mut ttls = Self::default();

        if let Some(raw) = settings.get(CREDENTIAL_TIMEOUT_KEY) {
            ttls.credential_secs = parse_ttl(CREDENTIAL_TIMEOUT_KEY, raw)?;
        }
        if let Some(raw) = settings.get(SESSION_TIMEOUT_KEY) {
            ttls.session_secs = parse_ttl(SESSION_TIMEOUT_KEY, raw)?;
        }

        Ok(ttls)
    }

    /// Fetch and resolve TTLs from a settings store.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self, UploadError> {
        let settings = store.get_by_names(&Self::SETTING_NAMES).await;
        Self::from_settings(&settings)
    }

    pub fn credential_ttl(&self) -> Duration {
        Duration::from_secs(self.credential_secs)
    }
}

fn parse_ttl(name: &str, raw: &str) -> Result<u64, UploadError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| UploadError::Config(format!("Invalid {} setting {:?}: {}", name, raw, e)))
}
