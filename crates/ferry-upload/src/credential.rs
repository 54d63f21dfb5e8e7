//! Delegated upload credentials
//!
//! Lets a client upload straight to the backend. The backend later calls back
//! with the token; the cached session tells the callback who uploaded what.

use std::sync::Arc;

use ferry_core::naming::random_key;
use ferry_core::{CallbackSession, Owner, SettingsStore, UploadCredential, UploadError, UploadTtls};
use ferry_storage::StorageHandler;

use crate::cache::SessionCache;

const CALLBACK_KEY_LEN: usize = 32;

/// Issues delegated credentials and records their callback sessions
#[derive(Clone)]
pub struct CredentialIssuer {
    handler: Arc<dyn StorageHandler>,
    settings: Arc<dyn SettingsStore>,
    cache: Arc<dyn SessionCache>,
}

impl CredentialIssuer {
    pub fn new(
        handler: Arc<dyn StorageHandler>,
        settings: Arc<dyn SettingsStore>,
        cache: Arc<dyn SessionCache>,
    ) -> Self {
        Self {
            handler,
            settings,
            cache,
        }
    }

    /// Issue a credential for a future upload of `size` bytes into `virtual_path`.
    ///
    /// No credential is returned unless its callback session was stored.
    #[tracing::instrument(
        skip(self, owner),
        fields(owner_id = ?owner.map(|o| o.id), backend = %self.handler.kind())
    )]
    pub async fn issue(
        &self,
        owner: Option<&Owner>,
        virtual_path: &str,
        size: u64,
    ) -> Result<UploadCredential, UploadError> {
        let ttls = UploadTtls::load(self.settings.as_ref()).await?;

        let callback_key = random_key(CALLBACK_KEY_LEN);

        let credential = self
            .handler
            .token(ttls.credential_ttl(), &callback_key)
            .await
            .map_err(|e| UploadError::Credential(e.to_string()))?;

        let session = CallbackSession {
            owner_id: owner.map(|o| o.id).unwrap_or(0),
            virtual_path: virtual_path.to_string(),
        };
        self.cache
            .set(
                &CallbackSession::cache_key(&callback_key),
                session,
                ttls.session_secs,
            )
            .await
            .map_err(|e| match e {
                UploadError::Cache(_) => e,
                other => UploadError::Cache(other.to_string()),
            })?;

        tracing::info!(
            expires_at = %credential.expires_at,
            session_ttl_secs = ttls.session_secs,
            "Issued upload credential"
        );

        Ok(credential)
    }
}
