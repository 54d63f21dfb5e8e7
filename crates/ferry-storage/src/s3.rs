use crate::keys::object_key;
use crate::traits::{StorageError, StorageHandler, StorageResult};
use crate::PolicyKind;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use ferry_core::naming::join_path;
use ferry_core::{ByteSource, SaveDestination, StoragePolicy, UploadCredential};
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// S3-compatible storage handler
#[derive(Clone, Debug)]
pub struct S3Handler {
    store: AmazonS3,
    bucket: String,
    policy: Arc<StoragePolicy>,
}

impl S3Handler {
    /// Create a new S3Handler for an s3 policy
    ///
    /// Credentials come from the standard AWS environment variables. A policy
    /// `server` is used as a custom endpoint for S3-compatible providers
    /// (e.g., "http://localhost:9000" for MinIO).
    pub fn new(policy: Arc<StoragePolicy>) -> StorageResult<Self> {
        let bucket = policy
            .bucket_name
            .clone()
            .ok_or_else(|| StorageError::ConfigError("S3 bucket not configured".to_string()))?;
        let region = policy
            .region
            .clone()
            .ok_or_else(|| StorageError::ConfigError("S3 region not configured".to_string()))?;

        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = policy.server {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Handler {
            store,
            bucket,
            policy,
        })
    }
}

#[async_trait]
impl StorageHandler for S3Handler {
    async fn put(
        &self,
        mut source: ByteSource,
        destination: &SaveDestination,
        size: u64,
    ) -> StorageResult<()> {
        let key = object_key(destination)?;
        let start = std::time::Instant::now();

        // object_store takes a complete payload for single-part puts.
        let mut buffer = Vec::with_capacity(usize::try_from(size).unwrap_or(0).min(64 << 20));
        source.read_to_end(&mut buffer).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
        })?;

        let written = buffer.len() as u64;
        let location = Path::from(key.clone());

        let result: ObjectResult<_> = self
            .store
            .put(&location, PutPayload::from(Bytes::from(buffer)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = written,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 put failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(())
    }

    async fn delete(&self, paths: &[String]) -> StorageResult<Vec<String>> {
        let mut failed = Vec::new();

        for raw in paths {
            let key = match object_key(&SaveDestination::new(raw.clone())) {
                Ok(key) => key,
                Err(_) => {
                    failed.push(raw.clone());
                    continue;
                }
            };

            let location = Path::from(key.clone());
            let result: ObjectResult<_> = self.store.delete(&location).await;
            match result {
                Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                    tracing::info!(bucket = %self.bucket, key = %key, "S3 delete successful");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        bucket = %self.bucket,
                        key = %key,
                        "S3 delete failed"
                    );
                    failed.push(raw.clone());
                }
            }
        }

        Ok(failed)
    }

    async fn token(&self, ttl: Duration, callback_key: &str) -> StorageResult<UploadCredential> {
        // Delegated uploads land under the policy directory, named after the
        // callback key; the callback moves them to their final name.
        let dir = self.policy.generate_path(0, "");
        let destination = SaveDestination::new(join_path(&format!("/{}", dir), callback_key));
        let key = object_key(&destination)?;
        let location = Path::from(key);

        let url_result: ObjectResult<_> = self.store.signed_url(Method::PUT, &location, ttl).await;
        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| StorageError::ConfigError("Credential TTL out of range".to_string()))?;

        Ok(UploadCredential {
            token: callback_key.to_string(),
            policy: None,
            upload_url: Some(url),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs),
        })
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::S3
    }
}
