//! Secondary report channel for failures that never reach the caller
//!
//! Compensation (AfterValidateFailed) and cancellation cleanup
//! (AfterUploadCanceled) failures are logged and, when a receiver is
//! attached, delivered here.

use ferry_core::SaveDestination;
use tokio::sync::mpsc;

use crate::hooks::HookEvent;

/// A hook failure that did not affect the result returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub event: HookEvent,
    pub file_name: String,
    pub destination: Option<SaveDestination>,
    pub message: String,
}

/// Sender side of the report channel; a no-op when detached
#[derive(Debug, Clone, Default)]
pub struct FailureReporter {
    tx: Option<mpsc::UnboundedSender<HookFailure>>,
}

impl FailureReporter {
    /// Reporter that drops everything
    pub fn detached() -> Self {
        Self::default()
    }

    /// Reporter paired with the receiving end of a fresh channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HookFailure>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn report(&self, failure: HookFailure) {
        if let Some(tx) = &self.tx {
            if tx.send(failure).is_err() {
                tracing::trace!("Hook failure receiver dropped");
            }
        }
    }
}
