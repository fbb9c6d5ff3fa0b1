//! Cache storage contract and the in-process implementation.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;
use tokio::time::Instant;

use super::config::CacheConfig;
use super::lock::mutex_lock;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache operation timed out")]
    Timeout,
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key-value store holding opaque serialized values with a TTL.
#[async_trait]
pub trait ReadCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Delete every key; absent keys are not an error.
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;
}

struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process LRU cache with per-entry deadlines.
///
/// Only coherent within a single process; deployments with more than one
/// replica should configure Redis.
pub struct MemoryReadCache {
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryReadCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.memory_capacity_non_zero())),
        }
    }

    /// Number of entries currently held, including expired ones not yet reaped.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReadCache for MemoryReadCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = mutex_lock(&self.entries, "get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        mutex_lock(&self.entries, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        let mut entries = mutex_lock(&self.entries, "delete");
        for key in keys {
            entries.pop(key);
        }
        Ok(())
    }
}
