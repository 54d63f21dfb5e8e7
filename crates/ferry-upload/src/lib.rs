//! Ferry Upload Library
//!
//! The upload orchestration engine: drives one file transfer through the
//! hook pipeline into a storage handler, watches for client aborts, and
//! issues delegated credentials for direct-to-backend uploads.
//!
//! Lifecycle of `UploadPipeline::upload`:
//! BeforeUpload → resolve destination → transfer → AfterUpload
//! (→ AfterValidateFailed when AfterUpload fails). AfterUploadCanceled is
//! fired by the cancellation watcher, at most once, only on client abort.

pub mod cache;
pub mod context;
pub mod credential;
pub mod hooks;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod watcher;

// Re-export commonly used types
pub use cache::{MemorySessionCache, SessionCache};
pub use context::UploadContext;
pub use credential::CredentialIssuer;
pub use hooks::{DeleteUploadedFile, FnHook, Hook, HookContext, HookEvent, HookSet, ValidateFile};
pub use pipeline::UploadPipeline;
pub use report::{FailureReporter, HookFailure};
pub use watcher::{CancellationWatcher, OperationScope};
