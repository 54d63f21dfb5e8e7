//! Hook dispatch table
//!
//! Hooks are externally supplied behavior (quota checks, metadata
//! persistence, scanning, cleanup) bound to lifecycle events. The engine only
//! guarantees when each event fires; a hook decides what happens.

mod builtin;

pub use builtin::{DeleteUploadedFile, FnHook, ValidateFile};

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use async_trait::async_trait;
use ferry_core::{FileInfo, Owner, SaveDestination, StoragePolicy, StoredObject, UploadError};
use ferry_storage::StorageHandler;

/// Upload lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeUpload,
    AfterUpload,
    AfterValidateFailed,
    AfterUploadCanceled,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::BeforeUpload => "BeforeUpload",
            HookEvent::AfterUpload => "AfterUpload",
            HookEvent::AfterValidateFailed => "AfterValidateFailed",
            HookEvent::AfterUploadCanceled => "AfterUploadCanceled",
        }
    }
}

impl Display for HookEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Everything a hook may inspect about the upload in flight
#[derive(Clone)]
pub struct HookContext {
    pub file: FileInfo,
    pub owner: Option<Owner>,
    /// Policy in effect for this upload (owner-bound or derived from the request)
    pub policy: Arc<StoragePolicy>,
    /// Resolved destination; `None` until the destination is computed
    pub destination: Option<SaveDestination>,
    /// Object being overwritten, for updates
    pub stored_object: Option<StoredObject>,
    pub handler: Arc<dyn StorageHandler>,
}

/// A callable bound to a lifecycle event
#[async_trait]
pub trait Hook: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    async fn call(&self, ctx: &HookContext) -> anyhow::Result<()>;
}

/// Mapping from event to an ordered list of hooks
#[derive(Clone, Default)]
pub struct HookSet {
    table: HashMap<HookEvent, Vec<Arc<dyn Hook>>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to an event; hooks run in registration order.
    pub fn use_hook(&mut self, event: HookEvent, hook: Arc<dyn Hook>) {
        self.table.entry(event).or_default().push(hook);
    }

    pub fn with(mut self, event: HookEvent, hook: impl Hook + 'static) -> Self {
        self.use_hook(event, Arc::new(hook));
        self
    }

    /// Whether any hook is registered for `event`
    pub fn has(&self, event: HookEvent) -> bool {
        self.table.get(&event).is_some_and(|hooks| !hooks.is_empty())
    }

    /// Run the hooks of `event` sequentially, stopping at the first failure.
    pub async fn trigger(&self, event: HookEvent, ctx: &HookContext) -> Result<(), UploadError> {
        let Some(hooks) = self.table.get(&event) else {
            return Ok(());
        };

        for hook in hooks {
            tracing::trace!(event = %event, hook = hook.name(), "Running hook");
            hook.call(ctx)
                .await
                .map_err(|e| UploadError::from_hook(event.as_str(), e))?;
        }

        Ok(())
    }
}
