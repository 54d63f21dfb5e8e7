#[path = "helpers/mod.rs"]
mod helpers;

use ferry_core::{CallbackSession, Owner, StaticSettings, StoragePolicy, UploadError};
use ferry_upload::{CredentialIssuer, MemorySessionCache, SessionCache};
use helpers::{FailingCache, HandlerCall, MockHandler};
use std::sync::Arc;
use std::time::Duration;

fn settings() -> StaticSettings {
    StaticSettings::default()
        .with("upload_credential_timeout", "3600")
        .with("upload_session_timeout", "86400")
}

fn issued_key(handler: &MockHandler) -> String {
    match handler.calls().as_slice() {
        [HandlerCall::Token { callback_key, .. }] => callback_key.clone(),
        other => panic!("unexpected handler calls: {:?}", other),
    }
}

#[tokio::test]
async fn test_issue_stores_callback_session() {
    let handler = Arc::new(MockHandler::new());
    let cache = MemorySessionCache::new();
    let issuer = CredentialIssuer::new(handler.clone(), Arc::new(settings()), Arc::new(cache.clone()));
    let owner = Owner::new(5, "five", Arc::new(StoragePolicy::default()));

    let credential = issuer.issue(Some(&owner), "/docs", 1024).await.unwrap();

    let key = issued_key(&handler);
    assert_eq!(key.len(), 32);
    assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(credential.token, format!("signed-{}", key));

    let session = cache.get(&format!("callback_{}", key)).await.unwrap();
    assert_eq!(
        session,
        Some(CallbackSession {
            owner_id: 5,
            virtual_path: "/docs".to_string(),
        })
    );
}

#[tokio::test]
async fn test_issue_uses_configured_credential_ttl() {
    let handler = Arc::new(MockHandler::new());
    let settings = StaticSettings::default().with("upload_credential_timeout", "600");
    let issuer = CredentialIssuer::new(
        handler.clone(),
        Arc::new(settings),
        Arc::new(MemorySessionCache::new()),
    );

    issuer.issue(None, "/", 1).await.unwrap();

    match handler.calls().as_slice() {
        [HandlerCall::Token { ttl, .. }] => assert_eq!(*ttl, Duration::from_secs(600)),
        other => panic!("unexpected handler calls: {:?}", other),
    }
}

#[tokio::test]
async fn test_anonymous_session_uses_owner_zero() {
    let handler = Arc::new(MockHandler::new());
    let cache = MemorySessionCache::new();
    let issuer = CredentialIssuer::new(handler.clone(), Arc::new(settings()), Arc::new(cache.clone()));

    issuer.issue(None, "/public", 1).await.unwrap();

    let session = cache
        .get(&CallbackSession::cache_key(&issued_key(&handler)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.owner_id, 0);
    assert_eq!(session.virtual_path, "/public");
}

#[tokio::test]
async fn test_each_credential_gets_a_fresh_key() {
    let handler = Arc::new(MockHandler::new());
    let cache = MemorySessionCache::new();
    let issuer = CredentialIssuer::new(handler.clone(), Arc::new(settings()), Arc::new(cache.clone()));

    let first = issuer.issue(None, "/", 1).await.unwrap();
    let second = issuer.issue(None, "/", 1).await.unwrap();

    assert_ne!(first.token, second.token);
    assert_eq!(cache.len().await, 2);
}

#[tokio::test]
async fn test_malformed_session_ttl_fails_before_token() {
    let handler = Arc::new(MockHandler::new());
    let settings = settings().with("upload_session_timeout", "abc");
    let issuer = CredentialIssuer::new(
        handler.clone(),
        Arc::new(settings),
        Arc::new(MemorySessionCache::new()),
    );

    let err = issuer.issue(None, "/", 1).await.unwrap_err();

    assert!(matches!(err, UploadError::Config(ref m) if m.contains("upload_session_timeout")));
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn test_token_failure_is_credential_error() {
    let handler = Arc::new(MockHandler::failing_token());
    let cache = MemorySessionCache::new();
    let issuer = CredentialIssuer::new(handler, Arc::new(settings()), Arc::new(cache.clone()));

    let err = issuer.issue(None, "/", 1).await.unwrap_err();

    assert!(matches!(err, UploadError::Credential(ref m) if m.contains("signing unavailable")));
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_cache_failure_returns_no_credential() {
    let handler = Arc::new(MockHandler::new());
    let issuer = CredentialIssuer::new(handler.clone(), Arc::new(settings()), Arc::new(FailingCache));

    let err = issuer.issue(None, "/", 1).await.unwrap_err();

    assert!(matches!(err, UploadError::Cache(ref m) if m.contains("connection refused")));
    // The backend token was minted but never handed out.
    assert_eq!(handler.calls().len(), 1);
}
