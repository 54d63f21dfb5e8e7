use crate::signing::HmacSigner;
use crate::traits::{StorageError, StorageHandler, StorageResult};
use crate::PolicyKind;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::Utc;
use ferry_core::{ByteSource, SaveDestination, StoragePolicy, UploadCredential, UploadPolicyHint};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;

const UPLOAD_ENDPOINT: &str = "/api/v3/slave/upload";
const DELETE_ENDPOINT: &str = "/api/v3/slave/delete";
/// Lifetime of the signature attached to master-initiated requests
const REQUEST_SIGN_TTL_SECS: i64 = 3600;

/// Encode an upload policy for the `X-Policy` header.
pub fn encode_upload_policy(hint: &UploadPolicyHint) -> StorageResult<String> {
    let json = serde_json::to_vec(hint)
        .map_err(|e| StorageError::BackendError(format!("Failed to encode policy: {}", e)))?;
    Ok(URL_SAFE.encode(json))
}

/// Decode an `X-Policy` header value back into an upload policy.
pub fn decode_upload_policy(encoded: &str) -> StorageResult<UploadPolicyHint> {
    let json = URL_SAFE
        .decode(encoded)
        .map_err(|e| StorageError::InvalidKey(format!("Malformed upload policy: {}", e)))?;
    serde_json::from_slice(&json)
        .map_err(|e| StorageError::InvalidKey(format!("Malformed upload policy: {}", e)))
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    code: i32,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Storage handler forwarding transfers to a remote ferry node
#[derive(Clone, Debug)]
pub struct RemoteHandler {
    client: reqwest::Client,
    server: String,
    signer: HmacSigner,
    policy: Arc<StoragePolicy>,
}

impl RemoteHandler {
    /// Create a new RemoteHandler for a remote policy
    ///
    /// The policy must carry the node's `server` URL and the shared `secret_key`.
    pub fn new(policy: Arc<StoragePolicy>) -> StorageResult<Self> {
        let server = policy
            .server
            .clone()
            .ok_or_else(|| StorageError::ConfigError("Remote server not configured".to_string()))?;
        let secret = policy.secret_key.as_deref().ok_or_else(|| {
            StorageError::ConfigError("Remote secret key not configured".to_string())
        })?;

        Ok(RemoteHandler {
            client: reqwest::Client::new(),
            server: server.trim_end_matches('/').to_string(),
            signer: HmacSigner::new(secret),
            policy,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    fn request_signature(&self, content: &str) -> StorageResult<String> {
        let expires = Utc::now().timestamp() + REQUEST_SIGN_TTL_SECS;
        Ok(format!("Bearer {}", self.signer.sign(content, expires)?))
    }

    async fn read_response(response: reqwest::Response) -> StorageResult<RemoteResponse> {
        let status = response.status();
        let body: RemoteResponse = response.json().await.map_err(|e| {
            StorageError::BackendError(format!("Invalid response from remote node ({}): {}", status, e))
        })?;
        Ok(body)
    }
}

#[async_trait]
impl StorageHandler for RemoteHandler {
    async fn put(
        &self,
        source: ByteSource,
        destination: &SaveDestination,
        size: u64,
    ) -> StorageResult<()> {
        let (dir, file_name) = destination
            .as_str()
            .rsplit_once('/')
            .unwrap_or(("", destination.as_str()));

        let policy = encode_upload_policy(&UploadPolicyHint {
            save_path: dir.to_string(),
            file_name: file_name.to_string(),
            ..Default::default()
        })?;
        let authorization = self.request_signature(&policy)?;

        let start = std::time::Instant::now();

        let response = self
            .client
            .put(self.endpoint(UPLOAD_ENDPOINT))
            .header("Authorization", authorization)
            .header("X-Policy", policy)
            .header("X-FileName", file_name)
            .header("X-FileSize", size.to_string())
            .header("X-Overwrite", "true")
            .body(reqwest::Body::wrap_stream(ReaderStream::new(source)))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    server = %self.server,
                    destination = %destination,
                    "Remote put request failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let body = Self::read_response(response).await?;
        if body.code != 0 {
            return Err(StorageError::UploadFailed(body.msg));
        }

        tracing::info!(
            server = %self.server,
            destination = %destination,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote put successful"
        );

        Ok(())
    }

    async fn delete(&self, paths: &[String]) -> StorageResult<Vec<String>> {
        let payload = serde_json::json!({ "files": paths }).to_string();
        let authorization = self.request_signature(&payload)?;

        let response = self
            .client
            .post(self.endpoint(DELETE_ENDPOINT))
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        let body = Self::read_response(response).await?;
        if body.code != 0 {
            return Err(StorageError::DeleteFailed(body.msg));
        }

        let failed = body
            .data
            .and_then(|data| serde_json::from_value::<Vec<String>>(data).ok())
            .unwrap_or_default();

        tracing::info!(
            server = %self.server,
            requested = paths.len(),
            failed = failed.len(),
            "Remote delete completed"
        );

        Ok(failed)
    }

    async fn token(&self, ttl: Duration, callback_key: &str) -> StorageResult<UploadCredential> {
        let hint = UploadPolicyHint {
            save_path: self.policy.dir_name_rule.clone(),
            file_name: self.policy.file_name_rule.clone(),
            auto_rename: self.policy.auto_rename,
            max_size: self.policy.max_size,
            allowed_extensions: self.policy.allowed_extensions.clone(),
            callback_key: Some(callback_key.to_string()),
        };
        let policy = encode_upload_policy(&hint)?;

        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| StorageError::ConfigError("Credential TTL out of range".to_string()))?;
        let expires_at = Utc::now() + chrono::Duration::seconds(ttl_secs);
        let token = self.signer.sign(&policy, expires_at.timestamp())?;

        Ok(UploadCredential {
            token,
            policy: Some(policy),
            upload_url: Some(self.endpoint(UPLOAD_ENDPOINT)),
            expires_at,
        })
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Remote
    }
}
