//! Ferry Core Library
//!
//! This crate provides the domain models, error type, configuration and
//! naming rules shared by the storage drivers and the upload engine.

pub mod config;
pub mod error;
pub mod models;
pub mod naming;
pub mod settings;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{ErrorMetadata, LogLevel, UploadError};
pub use models::{
    ByteSource, CallbackSession, FileInfo, Owner, SaveDestination, StoragePolicy, StoredObject,
    UploadCredential, UploadPolicyHint, UploadRequest,
};
pub use settings::{SettingsStore, StaticSettings, UploadTtls};
pub use storage_types::PolicyKind;
