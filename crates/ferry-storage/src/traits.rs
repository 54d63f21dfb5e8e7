//! Storage handler abstraction
//!
//! This module defines the contract every storage backend honors. The upload
//! engine never talks to a backend except through this trait.

use std::time::Duration;

use async_trait::async_trait;
use ferry_core::{ByteSource, PolicyKind, SaveDestination, UploadCredential};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Operation not supported by {backend} storage: {operation}")]
    Unsupported {
        backend: PolicyKind,
        operation: &'static str,
    },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage handler contract
///
/// All backend variants implement every method; operations a backend cannot
/// perform return `StorageError::Unsupported` instead of silently succeeding.
#[async_trait]
pub trait StorageHandler: Send + Sync {
    /// Transfer `size` bytes from `source` to `destination`, overwriting any
    /// existing object at that location.
    ///
    /// A client disconnect surfaces here as a read error from `source`.
    async fn put(
        &self,
        source: ByteSource,
        destination: &SaveDestination,
        size: u64,
    ) -> StorageResult<()>;

    /// Delete objects by destination path.
    ///
    /// Returns the paths that could not be deleted. Paths that do not exist
    /// are not failures, so deleting twice is harmless.
    async fn delete(&self, paths: &[String]) -> StorageResult<Vec<String>>;

    /// Issue a delegated upload credential valid for `ttl`, bound to
    /// `callback_key`.
    async fn token(&self, ttl: Duration, callback_key: &str) -> StorageResult<UploadCredential>;

    /// Get the backend kind
    fn kind(&self) -> PolicyKind;
}
