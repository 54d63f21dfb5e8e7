//! Ferry Storage Library
//!
//! This crate provides the `StorageHandler` contract consumed by the upload
//! engine and the backend drivers implementing it: local filesystem, remote
//! ferry node and S3-compatible object stores.
//!
//! # Key format
//!
//! Handlers receive rooted, cleaned save destinations (e.g. `/uploads/1/a.txt`).
//! Backend object keys drop the leading `/` and must not contain `..`;
//! conversion is centralized in the `keys` module so all drivers agree.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-remote")]
pub mod remote;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::create_handler;
pub use ferry_core::PolicyKind;
#[cfg(feature = "storage-local")]
pub use local::LocalHandler;
#[cfg(feature = "storage-remote")]
pub use remote::RemoteHandler;
#[cfg(feature = "storage-s3")]
pub use s3::S3Handler;
pub use signing::HmacSigner;
pub use traits::{StorageError, StorageHandler, StorageResult};
