//! Per-upload operation context

use ferry_core::{Owner, StoredObject, UploadPolicyHint};
use tokio_util::sync::CancellationToken;

/// Inputs of one upload that come from the surrounding request
///
/// `request_token` is the request-scoped end-of-life signal: the HTTP layer
/// cancels it when the client connection closes, whatever the reason.
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub owner: Option<Owner>,
    /// Set when the upload overwrites an existing object
    pub stored_object: Option<StoredObject>,
    /// Caller-declared policy for anonymous uploads
    pub policy_hint: Option<UploadPolicyHint>,
    pub request_token: CancellationToken,
}

impl UploadContext {
    pub fn new(request_token: CancellationToken) -> Self {
        Self {
            owner: None,
            stored_object: None,
            policy_hint: None,
            request_token,
        }
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Mark this upload as an in-place update of `object`.
    pub fn for_update(mut self, object: StoredObject) -> Self {
        self.stored_object = Some(object);
        self
    }

    pub fn with_policy_hint(mut self, hint: UploadPolicyHint) -> Self {
        self.policy_hint = Some(hint);
        self
    }
}
