//! Callback session cache
//!
//! The shared cache correlates an asynchronous backend callback with the
//! owner and virtual path that requested the delegated upload. Any backend
//! (Redis, memcached, a database table) can sit behind `SessionCache`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ferry_core::{CallbackSession, UploadError};
use tokio::sync::RwLock;

/// Key-value cache with per-entry TTL
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Store `session` under `key` for `ttl_secs` seconds; 0 means no expiry.
    async fn set(&self, key: &str, session: CallbackSession, ttl_secs: u64)
        -> Result<(), UploadError>;

    /// Look up a live session.
    async fn get(&self, key: &str) -> Result<Option<CallbackSession>, UploadError>;

    async fn delete(&self, key: &str) -> Result<(), UploadError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    session: CallbackSession,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process session cache
///
/// Expired entries are hidden from reads and purged lazily on the next write.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn set(
        &self,
        key: &str,
        session: CallbackSession,
        ttl_secs: u64,
    ) -> Result<(), UploadError> {
        let now = Instant::now();
        let expires_at = match ttl_secs {
            0 => None,
            secs => Some(
                now.checked_add(Duration::from_secs(secs))
                    .ok_or_else(|| UploadError::Cache(format!("TTL {}s out of range", secs)))?,
            ),
        };

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(key.to_string(), CacheEntry { session, expires_at });

        tracing::trace!(key = %key, ttl_secs, "Cached callback session");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<CallbackSession>, UploadError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.session.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), UploadError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
