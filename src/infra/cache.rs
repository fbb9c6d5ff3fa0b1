//! Redis-backed listing cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::info;

use crate::cache::{CacheError, ReadCache};

use super::error::InfraError;

/// Shares one multiplexed connection; the manager reconnects on its own.
#[derive(Clone)]
pub struct RedisReadCache {
    manager: ConnectionManager,
}

impl RedisReadCache {
    pub async fn connect(redis_url: &str) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url)
            .map_err(|err| InfraError::cache(format!("invalid redis url: {err}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|err| InfraError::cache(format!("failed to connect to redis: {err}")))?;
        info!(target = "pictura::cache", "connected to redis read cache");
        Ok(Self { manager })
    }
}

#[async_trait]
impl ReadCache for RedisReadCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(CacheError::backend)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(CacheError::backend)
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(keys)
            .await
            .map_err(CacheError::backend)
    }
}
