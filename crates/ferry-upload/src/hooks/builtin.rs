//! Stock hooks shipped with the engine

use std::future::Future;

use async_trait::async_trait;
use ferry_core::UploadError;

use super::{Hook, HookContext};

const MAX_FILE_NAME_LEN: usize = 255;
const ILLEGAL_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Rejects uploads whose name, size or extension violates the effective policy
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateFile;

impl ValidateFile {
    fn check(ctx: &HookContext) -> Result<(), UploadError> {
        let name = ctx.file.file_name.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.len() > MAX_FILE_NAME_LEN
            || name.contains(ILLEGAL_NAME_CHARS)
        {
            return Err(UploadError::InvalidInput(format!(
                "Invalid file name: {:?}",
                name
            )));
        }

        let max_size = ctx.policy.max_size;
        if max_size > 0 && ctx.file.size > max_size {
            return Err(UploadError::InvalidInput(format!(
                "File size {} exceeds the limit of {} bytes",
                ctx.file.size, max_size
            )));
        }

        if !ctx.policy.is_extension_allowed(name) {
            return Err(UploadError::InvalidInput(format!(
                "File type of {:?} is not allowed",
                name
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Hook for ValidateFile {
    fn name(&self) -> &str {
        "validate_file"
    }

    async fn call(&self, ctx: &HookContext) -> anyhow::Result<()> {
        Self::check(ctx)?;
        Ok(())
    }
}

/// Deletes whatever was written at the resolved destination
///
/// Deleting a destination that holds nothing is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteUploadedFile;

#[async_trait]
impl Hook for DeleteUploadedFile {
    fn name(&self) -> &str {
        "delete_uploaded_file"
    }

    async fn call(&self, ctx: &HookContext) -> anyhow::Result<()> {
        let Some(destination) = ctx.destination.as_ref() else {
            return Ok(());
        };

        let failed = ctx.handler.delete(&[destination.to_string()]).await?;
        if !failed.is_empty() {
            anyhow::bail!("Failed to delete {}", failed.join(", "));
        }

        tracing::debug!(destination = %destination, "Deleted uploaded file");
        Ok(())
    }
}

/// Adapts an async closure into a hook
pub struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> FnHook<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> Hook for FnHook<F>
where
    F: Fn(HookContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, ctx: &HookContext) -> anyhow::Result<()> {
        (self.f)(ctx.clone()).await
    }
}
