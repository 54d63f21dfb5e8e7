//! Client-abort detection
//!
//! Each upload races two signals: the request token (the client went away)
//! and the operation scope (the pipeline finished). Whichever side settles
//! the scope first wins; the canceled event fires only when the request side
//! wins, and at most once per upload.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::hooks::{HookContext, HookEvent, HookSet};
use crate::report::{FailureReporter, HookFailure};

const RUNNING: u8 = 0;
const COMPLETED: u8 = 1;
const ABORTED: u8 = 2;

/// Lifetime of one upload operation
///
/// The state moves out of running exactly once, either to completed (the
/// pipeline got there first) or to aborted (the watcher did).
#[derive(Debug, Clone)]
pub struct OperationScope {
    state: Arc<AtomicU8>,
    done: CancellationToken,
}

impl Default for OperationScope {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationScope {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RUNNING)),
            done: CancellationToken::new(),
        }
    }

    /// Mark the operation finished. Returns false if it was already aborted.
    pub fn complete(&self) -> bool {
        let won = self
            .state
            .compare_exchange(RUNNING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.done.cancel();
        won
    }

    /// Claim the operation as aborted. Returns false if it already finished.
    pub fn claim_abort(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, ABORTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Resolves once `complete` has been called.
    pub async fn finished(&self) {
        self.done.cancelled().await
    }
}

/// Fires AfterUploadCanceled when the client disconnects mid-upload
pub struct CancellationWatcher {
    hooks: Arc<HookSet>,
    context: HookContext,
    reporter: FailureReporter,
}

impl CancellationWatcher {
    pub fn new(hooks: Arc<HookSet>, context: HookContext, reporter: FailureReporter) -> Self {
        Self {
            hooks,
            context,
            reporter,
        }
    }

    /// Run the watcher in the background. The handle yields whether the
    /// watcher claimed the operation as aborted.
    pub fn spawn(self, request: CancellationToken, operation: OperationScope) -> JoinHandle<bool> {
        tokio::spawn(async move { self.watch(request, operation).await })
    }

    pub async fn watch(self, request: CancellationToken, operation: OperationScope) -> bool {
        tokio::select! {
            biased;
            _ = operation.finished() => return false,
            _ = request.cancelled() => {}
        }

        if !operation.claim_abort() {
            return false;
        }

        let file_name = self.context.file.file_name.clone();
        tracing::info!(file_name = %file_name, "Client canceled upload");

        if !self.hooks.has(HookEvent::AfterUploadCanceled) {
            return true;
        }

        if let Err(e) = self
            .hooks
            .trigger(HookEvent::AfterUploadCanceled, &self.context)
            .await
        {
            tracing::debug!(
                error = %e,
                file_name = %file_name,
                "AfterUploadCanceled hook failed"
            );
            self.reporter.report(HookFailure {
                event: HookEvent::AfterUploadCanceled,
                file_name,
                destination: self.context.destination.clone(),
                message: e.to_string(),
            });
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::FnHook;
    use ferry_core::{FileInfo, StoragePolicy};
    use std::sync::atomic::AtomicUsize;

    async fn context() -> (HookContext, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let handler = ferry_storage::LocalHandler::new(dir.path()).await.unwrap();
        let ctx = HookContext {
            file: FileInfo {
                file_name: "a.txt".to_string(),
                ..Default::default()
            },
            owner: None,
            policy: Arc::new(StoragePolicy::default()),
            destination: None,
            stored_object: None,
            handler: Arc::new(handler),
        };
        (ctx, dir)
    }

    fn counting_hooks(count: Arc<AtomicUsize>) -> Arc<HookSet> {
        Arc::new(HookSet::new().with(
            HookEvent::AfterUploadCanceled,
            FnHook::new("count", move |_ctx: HookContext| {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), anyhow::Error>(())
                }
            }),
        ))
    }

    #[test]
    fn test_scope_settles_once() {
        let scope = OperationScope::new();
        assert!(scope.complete());
        assert!(!scope.claim_abort());
        assert!(!scope.complete());

        let scope = OperationScope::new();
        assert!(scope.claim_abort());
        assert!(!scope.claim_abort());
        assert!(!scope.complete());
    }

    #[tokio::test]
    async fn test_operation_finishing_first_suppresses_canceled_event() {
        let count = Arc::new(AtomicUsize::new(0));
        let (ctx, _dir) = context().await;
        let request = CancellationToken::new();
        let operation = OperationScope::new();

        let handle = CancellationWatcher::new(counting_hooks(count.clone()), ctx, FailureReporter::detached())
            .spawn(request.clone(), operation.clone());

        operation.complete();
        request.cancel();

        assert!(!handle.await.unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_ending_first_fires_canceled_event_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let (ctx, _dir) = context().await;
        let request = CancellationToken::new();
        let operation = OperationScope::new();

        let handle = CancellationWatcher::new(counting_hooks(count.clone()), ctx, FailureReporter::detached())
            .spawn(request.clone(), operation.clone());

        request.cancel();
        assert!(handle.await.unwrap());
        assert!(!operation.complete());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_canceled_hook_failure_is_reported() {
        let (ctx, _dir) = context().await;
        let hooks = Arc::new(HookSet::new().with(
            HookEvent::AfterUploadCanceled,
            FnHook::new("boom", |_ctx: HookContext| async move {
                Err::<(), _>(anyhow::anyhow!("cleanup failed"))
            }),
        ));
        let (reporter, mut rx) = FailureReporter::channel();
        let request = CancellationToken::new();
        request.cancel();

        let aborted = CancellationWatcher::new(hooks, ctx, reporter)
            .watch(request, OperationScope::new())
            .await;

        assert!(aborted);
        let failure = rx.recv().await.unwrap();
        assert_eq!(failure.event, HookEvent::AfterUploadCanceled);
        assert!(failure.message.contains("cleanup failed"));
    }

    #[tokio::test]
    async fn test_abort_without_canceled_hooks() {
        let (ctx, _dir) = context().await;
        let request = CancellationToken::new();
        request.cancel();

        let aborted = CancellationWatcher::new(Arc::new(HookSet::new()), ctx, FailureReporter::detached())
            .watch(request, OperationScope::new())
            .await;
        assert!(aborted);
    }
}
