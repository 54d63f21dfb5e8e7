#[cfg(feature = "storage-local")]
use crate::LocalHandler;
#[cfg(feature = "storage-remote")]
use crate::RemoteHandler;
#[cfg(feature = "storage-s3")]
use crate::S3Handler;
use crate::{PolicyKind, StorageError, StorageHandler, StorageResult};
use ferry_core::StoragePolicy;
use std::sync::Arc;

/// Create the storage handler for a policy
pub async fn create_handler(policy: Arc<StoragePolicy>) -> StorageResult<Arc<dyn StorageHandler>> {
    match policy.kind {
        #[cfg(feature = "storage-local")]
        PolicyKind::Local => {
            let base_path = policy.base_path.clone().ok_or_else(|| {
                StorageError::ConfigError("Local base path not configured".to_string())
            })?;
            let handler = LocalHandler::new(base_path).await?;
            Ok(Arc::new(handler))
        }

        #[cfg(not(feature = "storage-local"))]
        PolicyKind::Local => Err(StorageError::ConfigError(
            "Local storage handler not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-remote")]
        PolicyKind::Remote => Ok(Arc::new(RemoteHandler::new(policy)?)),

        #[cfg(not(feature = "storage-remote"))]
        PolicyKind::Remote => Err(StorageError::ConfigError(
            "Remote storage handler not available (storage-remote feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-s3")]
        PolicyKind::S3 => Ok(Arc::new(S3Handler::new(policy)?)),

        #[cfg(not(feature = "storage-s3"))]
        PolicyKind::S3 => Err(StorageError::ConfigError(
            "S3 storage handler not available (storage-s3 feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local", feature = "storage-remote"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_local_handler() {
        let dir = tempfile::tempdir().unwrap();
        let policy = StoragePolicy {
            kind: PolicyKind::Local,
            base_path: Some(dir.path().display().to_string()),
            ..Default::default()
        };

        let handler = create_handler(Arc::new(policy)).await.unwrap();
        assert_eq!(handler.kind(), PolicyKind::Local);
    }

    #[tokio::test]
    async fn test_create_remote_handler_requires_server() {
        let policy = StoragePolicy {
            kind: PolicyKind::Remote,
            ..Default::default()
        };

        let result = create_handler(Arc::new(policy)).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
