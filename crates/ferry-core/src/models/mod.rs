pub mod credential;
pub mod owner;
pub mod policy;
pub mod upload;

pub use credential::{CallbackSession, UploadCredential};
pub use owner::Owner;
pub use policy::{StoragePolicy, UploadPolicyHint};
pub use upload::{ByteSource, FileInfo, SaveDestination, StoredObject, UploadRequest};
