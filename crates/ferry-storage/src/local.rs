use crate::keys::object_key;
use crate::traits::{StorageError, StorageHandler, StorageResult};
use crate::PolicyKind;
use async_trait::async_trait;
use ferry_core::{ByteSource, SaveDestination, UploadCredential};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage handler
#[derive(Clone, Debug)]
pub struct LocalHandler {
    base_path: PathBuf,
}

impl LocalHandler {
    /// Create a new LocalHandler instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored files (e.g., "/var/lib/ferry/uploads")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalHandler { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a destination to a filesystem path with traversal validation
    fn destination_to_path(&self, destination: &SaveDestination) -> StorageResult<PathBuf> {
        let key = object_key(destination)?;
        let path = self.base_path.join(&key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // Symlinks inside the root may still point outside of it.
        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        } else {
            // Not created yet: check the nearest existing ancestor instead.
            let mut current = path.clone();
            loop {
                if current == self.base_path {
                    break;
                }
                if let Some(parent) = current.parent() {
                    let parent_buf = parent.to_path_buf();
                    if parent_buf.strip_prefix(&self.base_path).is_err() && parent_buf != self.base_path {
                        return Err(StorageError::InvalidKey(
                            "Storage key resolves outside storage directory".to_string(),
                        ));
                    }
                    if let Ok(canonical) = parent_buf.canonicalize() {
                        if canonical.strip_prefix(&base_canonical).is_err() {
                            return Err(StorageError::InvalidKey(
                                "Storage key resolves outside storage directory".to_string(),
                            ));
                        }
                        break;
                    }
                    current = parent_buf;
                } else {
                    break;
                }
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageHandler for LocalHandler {
    async fn put(
        &self,
        mut source: ByteSource,
        destination: &SaveDestination,
        size: u64,
    ) -> StorageResult<()> {
        let path = self.destination_to_path(destination)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let written = tokio::io::copy(&mut source, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.flush().await?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        if written != size {
            tracing::warn!(
                path = %path.display(),
                declared_size = size,
                written_bytes = written,
                "Written size differs from declared size"
            );
        }

        tracing::info!(
            path = %path.display(),
            destination = %destination,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );

        Ok(())
    }

    async fn delete(&self, paths: &[String]) -> StorageResult<Vec<String>> {
        let mut failed = Vec::new();

        for raw in paths {
            let destination = SaveDestination::new(raw.clone());
            let path = match self.destination_to_path(&destination) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, path = %raw, "Refusing to delete invalid path");
                    failed.push(raw.clone());
                    continue;
                }
            };

            match fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Local storage delete successful");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "File already absent");
                }
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Local storage delete failed");
                    failed.push(raw.clone());
                }
            }
        }

        Ok(failed)
    }

    async fn token(&self, _ttl: Duration, _callback_key: &str) -> StorageResult<UploadCredential> {
        Err(StorageError::Unsupported {
            backend: PolicyKind::Local,
            operation: "token",
        })
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Local
    }
}
