use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

/// Readable byte source for a transfer
pub type ByteSource = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// In-flight upload attempt
///
/// Owned by the pipeline for the duration of one call. The byte source is
/// handed to the storage handler; everything else is kept as `FileInfo`.
pub struct UploadRequest {
    pub source: ByteSource,
    /// Declared size in bytes
    pub size: u64,
    /// Client-reported file name
    pub file_name: String,
    /// Client-reported virtual (logical) directory
    pub virtual_path: String,
    /// Arbitrary transfer metadata
    pub metadata: HashMap<String, String>,
}

impl UploadRequest {
    pub fn new(
        source: ByteSource,
        size: u64,
        file_name: impl Into<String>,
        virtual_path: impl Into<String>,
    ) -> Self {
        Self {
            source,
            size,
            file_name: file_name.into(),
            virtual_path: virtual_path.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Split the request into its byte source and descriptive part.
    pub fn into_parts(self) -> (ByteSource, FileInfo) {
        let info = FileInfo {
            file_name: self.file_name,
            size: self.size,
            virtual_path: self.virtual_path,
            metadata: self.metadata,
        };
        (self.source, info)
    }
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadRequest")
            .field("size", &self.size)
            .field("file_name", &self.file_name)
            .field("virtual_path", &self.virtual_path)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Descriptive part of an upload, visible to hooks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_name: String,
    pub size: u64,
    pub virtual_path: String,
    pub metadata: HashMap<String, String>,
}

/// Resolved backend-relative location for the bytes of one upload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveDestination(String);

impl SaveDestination {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SaveDestination {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<String> for SaveDestination {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Previously stored object that an update overwrites in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: u64,
    pub name: String,
    /// Recorded backend location of the object's bytes
    pub source_name: String,
    pub size: u64,
}
