#![allow(dead_code)]

pub mod hooks;

use async_trait::async_trait;
use chrono::Utc;
use ferry_core::{
    ByteSource, CallbackSession, PolicyKind, SaveDestination, UploadCredential, UploadError,
    UploadRequest,
};
use ferry_storage::{StorageError, StorageHandler, StorageResult};
use ferry_upload::SessionCache;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::Notify;

/// Call made against a `MockHandler`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerCall {
    Put { destination: String, body: Vec<u8> },
    Delete(Vec<String>),
    Token { ttl: Duration, callback_key: String },
}

/// Storage handler that records calls and can be made to block or fail
#[derive(Default)]
pub struct MockHandler {
    pub calls: Mutex<Vec<HandlerCall>>,
    pub fail_put: bool,
    pub fail_token: bool,
    /// When set, `put` waits on this before returning
    pub gate: Option<Arc<Notify>>,
    /// Notified once `put` has started
    pub started: Arc<Notify>,
}

impl MockHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_put() -> Self {
        Self {
            fail_put: true,
            ..Default::default()
        }
    }

    pub fn failing_token() -> Self {
        Self {
            fail_token: true,
            ..Default::default()
        }
    }

    /// Handler whose `put` blocks until the returned gate is notified
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let handler = Self {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        (handler, gate)
    }

    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HandlerCall::Put { destination, .. } => Some(destination),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl StorageHandler for MockHandler {
    async fn put(
        &self,
        mut source: ByteSource,
        destination: &SaveDestination,
        _size: u64,
    ) -> StorageResult<()> {
        self.started.notify_one();

        let mut body = Vec::new();
        source.read_to_end(&mut body).await?;
        self.calls.lock().unwrap().push(HandlerCall::Put {
            destination: destination.to_string(),
            body,
        });

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.fail_put {
            return Err(StorageError::UploadFailed("disk full".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, paths: &[String]) -> StorageResult<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push(HandlerCall::Delete(paths.to_vec()));
        Ok(Vec::new())
    }

    async fn token(&self, ttl: Duration, callback_key: &str) -> StorageResult<UploadCredential> {
        self.calls.lock().unwrap().push(HandlerCall::Token {
            ttl,
            callback_key: callback_key.to_string(),
        });

        if self.fail_token {
            return Err(StorageError::BackendError("signing unavailable".to_string()));
        }

        Ok(UploadCredential {
            token: format!("signed-{}", callback_key),
            policy: None,
            upload_url: Some(format!("https://storage.test/{}", callback_key)),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
        })
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Remote
    }
}

/// Session cache whose writes always fail
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl SessionCache for FailingCache {
    async fn set(&self, _key: &str, _session: CallbackSession, _ttl_secs: u64) -> Result<(), UploadError> {
        Err(UploadError::Cache("connection refused".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<CallbackSession>, UploadError> {
        Ok(None)
    }

    async fn delete(&self, _key: &str) -> Result<(), UploadError> {
        Ok(())
    }
}

pub fn upload_request(body: &'static [u8], file_name: &str, virtual_path: &str) -> UploadRequest {
    UploadRequest::new(Box::pin(body), body.len() as u64, file_name, virtual_path)
}
