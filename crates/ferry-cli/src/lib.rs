use std::sync::Arc;

use ferry_core::{Owner, StoragePolicy};
use ferry_upload::{DeleteUploadedFile, HookEvent, HookFailure, HookSet, ValidateFile};
use tokio::sync::mpsc::UnboundedReceiver;

/// Hooks installed by the command-line uploader.
///
/// Files are validated before transfer and removed again if the upload is
/// rejected afterwards or the transfer is interrupted.
pub fn default_hooks() -> HookSet {
    HookSet::new()
        .with(HookEvent::BeforeUpload, ValidateFile)
        .with(HookEvent::AfterValidateFailed, DeleteUploadedFile)
        .with(HookEvent::AfterUploadCanceled, DeleteUploadedFile)
}

/// Owner bound to the configured policy, or anonymous when `owner_id` is absent or 0.
pub fn owner_for(owner_id: Option<u64>, policy: &Arc<StoragePolicy>) -> Option<Owner> {
    owner_id
        .filter(|id| *id != 0)
        .map(|id| Owner::new(id, format!("user-{}", id), policy.clone()))
}

/// Log every reported cleanup failure until all senders are dropped.
///
/// Returns the number of failures seen.
pub async fn drain_failures(mut failures: UnboundedReceiver<HookFailure>) -> usize {
    let mut seen = 0;
    while let Some(failure) = failures.recv().await {
        tracing::warn!(
            event = %failure.event,
            file_name = %failure.file_name,
            error = %failure.message,
            "Cleanup hook failed"
        );
        seen += 1;
    }
    seen
}
