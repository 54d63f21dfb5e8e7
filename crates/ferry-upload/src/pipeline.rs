//! Upload pipeline
//!
//! Drives one transfer through the hook lifecycle into the storage handler.

use std::sync::Arc;

use ferry_core::{ByteSource, SaveDestination, UploadError, UploadRequest};
use ferry_storage::StorageHandler;

use crate::context::UploadContext;
use crate::hooks::{HookContext, HookEvent, HookSet};
use crate::report::{FailureReporter, HookFailure};
use crate::resolver;
use crate::watcher::{CancellationWatcher, OperationScope};

/// Upload orchestrator bound to one storage handler and hook set
#[derive(Clone)]
pub struct UploadPipeline {
    handler: Arc<dyn StorageHandler>,
    hooks: Arc<HookSet>,
    reporter: FailureReporter,
}

impl UploadPipeline {
    pub fn new(handler: Arc<dyn StorageHandler>) -> Self {
        Self {
            handler,
            hooks: Arc::new(HookSet::new()),
            reporter: FailureReporter::detached(),
        }
    }

    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Deliver compensation and cleanup failures to `reporter`.
    pub fn with_failure_reporter(mut self, reporter: FailureReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Store one file.
    ///
    /// Returns the destination the bytes were written to, or the first hook or
    /// handler error. AfterUpload failures are compensated by
    /// AfterValidateFailed before returning. A client abort only triggers
    /// AfterUploadCanceled in the background; it never changes the result.
    #[tracing::instrument(
        skip(self, ctx, request),
        fields(
            file_name = %request.file_name,
            size = request.size,
            owner_id = ?ctx.owner.as_ref().map(|o| o.id),
            backend = %self.handler.kind()
        )
    )]
    pub async fn upload(
        &self,
        ctx: UploadContext,
        request: UploadRequest,
    ) -> Result<SaveDestination, UploadError> {
        let (source, file) = request.into_parts();
        let policy = resolver::effective_policy(ctx.owner.as_ref(), ctx.policy_hint.as_ref());

        let mut hook_ctx = HookContext {
            file,
            owner: ctx.owner,
            policy,
            destination: None,
            stored_object: ctx.stored_object,
            handler: self.handler.clone(),
        };

        self.hooks.trigger(HookEvent::BeforeUpload, &hook_ctx).await?;

        // Updates overwrite the existing object in place.
        let destination = match hook_ctx.stored_object.as_ref() {
            Some(object) => SaveDestination::new(object.source_name.clone()),
            None => resolver::resolve(&hook_ctx.policy, hook_ctx.owner.as_ref(), &hook_ctx.file),
        };
        hook_ctx.destination = Some(destination.clone());

        let operation = OperationScope::new();
        CancellationWatcher::new(self.hooks.clone(), hook_ctx.clone(), self.reporter.clone())
            .spawn(ctx.request_token.clone(), operation.clone());

        let result = self.transfer(&hook_ctx, source).await;

        if !operation.complete() {
            tracing::debug!(destination = %destination, "Upload finished after client abort");
        }

        result.map(|()| destination)
    }

    async fn transfer(&self, ctx: &HookContext, source: ByteSource) -> Result<(), UploadError> {
        let destination = ctx
            .destination
            .as_ref()
            .ok_or_else(|| UploadError::Internal("destination not resolved".to_string()))?;

        // A client disconnect reaches the handler as a read error on `source`.
        self.handler
            .put(source, destination, ctx.file.size)
            .await
            .map_err(|e| UploadError::Transfer(e.to_string()))?;

        if let Err(err) = self.hooks.trigger(HookEvent::AfterUpload, ctx).await {
            if let Err(compensation) = self.hooks.trigger(HookEvent::AfterValidateFailed, ctx).await {
                tracing::debug!(
                    error = %compensation,
                    destination = %destination,
                    "AfterValidateFailed hook failed"
                );
                self.reporter.report(HookFailure {
                    event: HookEvent::AfterValidateFailed,
                    file_name: ctx.file.file_name.clone(),
                    destination: Some(destination.clone()),
                    message: compensation.to_string(),
                });
            }
            return Err(err);
        }

        tracing::info!(
            target: "ferry::audit",
            event_type = "file_uploaded",
            file_name = %ctx.file.file_name,
            size = ctx.file.size,
            owner_id = ctx.owner.as_ref().map(|o| o.id).unwrap_or(0),
            owner = ctx.owner.as_ref().map(|o| o.nick.as_str()).unwrap_or("anonymous"),
            destination = %destination,
            "File uploaded"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::FnHook;
    use ferry_core::{Owner, StoragePolicy, StoredObject, UploadPolicyHint};
    use ferry_storage::LocalHandler;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    fn request(body: &'static [u8], name: &str) -> UploadRequest {
        UploadRequest::new(Box::pin(body), body.len() as u64, name, "/")
    }

    async fn pipeline() -> (UploadPipeline, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let handler = LocalHandler::new(dir.path()).await.unwrap();
        (UploadPipeline::new(Arc::new(handler)), dir)
    }

    #[tokio::test]
    async fn test_anonymous_upload_lands_at_hint_destination() {
        let (pipeline, dir) = pipeline().await;
        let ctx = UploadContext::new(CancellationToken::new()).with_policy_hint(UploadPolicyHint {
            save_path: "/anon".to_string(),
            file_name: "{name}".to_string(),
            auto_rename: false,
            ..Default::default()
        });

        let destination = pipeline.upload(ctx, request(b"hello", "a.txt")).await.unwrap();

        assert_eq!(destination.as_str(), "/anon/a.txt");
        assert_eq!(std::fs::read(dir.path().join("anon/a.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_update_reuses_stored_source_name() {
        let (pipeline, dir) = pipeline().await;
        let owner = Owner::new(
            3,
            "three",
            Arc::new(StoragePolicy {
                dir_name_rule: "/fresh/{uid}".to_string(),
                auto_rename: true,
                file_name_rule: "{randomkey16}".to_string(),
                ..Default::default()
            }),
        );
        let ctx = UploadContext::new(CancellationToken::new())
            .with_owner(owner)
            .for_update(StoredObject {
                id: 1,
                name: "notes.txt".to_string(),
                source_name: "/existing/notes.txt".to_string(),
                size: 3,
            });

        let destination = pipeline.upload(ctx, request(b"new", "notes.txt")).await.unwrap();

        assert_eq!(destination.as_str(), "/existing/notes.txt");
        assert!(dir.path().join("existing/notes.txt").exists());
    }

    #[tokio::test]
    async fn test_before_upload_failure_skips_transfer() {
        let (pipeline, dir) = pipeline().await;
        let calls = Arc::new(Mutex::new(Vec::new()));
        let after = calls.clone();
        let hooks = HookSet::new()
            .with(
                HookEvent::BeforeUpload,
                FnHook::new("deny", |_ctx: HookContext| async move {
                    Err::<(), _>(anyhow::anyhow!("quota exceeded"))
                }),
            )
            .with(
                HookEvent::AfterUpload,
                FnHook::new("record", move |_ctx: HookContext| {
                    let after = after.clone();
                    async move {
                        after.lock().unwrap().push("after");
                        Ok::<(), anyhow::Error>(())
                    }
                }),
            );
        let pipeline = pipeline.with_hooks(hooks);

        let err = pipeline
            .upload(UploadContext::new(CancellationToken::new()), request(b"x", "a.txt"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Hook { event: "BeforeUpload", .. }));
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
