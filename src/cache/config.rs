//! Cache configuration.
//!
//! Controls key namespacing, listing TTLs and backend timeouts via `pictura.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_KEY_PREFIX: &str = "posts:";
const DEFAULT_GLOBAL_TTL_SECS: u64 = 300;
const DEFAULT_USER_TTL_SECS: u64 = 120;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 500;
const DEFAULT_MEMORY_CAPACITY: usize = 1024;

/// Cache configuration from `pictura.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis connection URL; the in-process cache is used when absent.
    pub redis_url: Option<String>,
    /// Namespace prepended to every listing key.
    pub key_prefix: String,
    /// TTL of the global listing, in seconds.
    pub global_ttl_seconds: u64,
    /// TTL of per-username listings, in seconds.
    pub user_ttl_seconds: u64,
    /// Upper bound on a single cache round-trip (ms).
    pub operation_timeout_ms: u64,
    /// Maximum entries held by the in-process cache.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            global_ttl_seconds: DEFAULT_GLOBAL_TTL_SECS,
            user_ttl_seconds: DEFAULT_USER_TTL_SECS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            redis_url: settings.redis_url.clone(),
            key_prefix: settings.key_prefix.clone(),
            global_ttl_seconds: settings.global_ttl.as_secs(),
            user_ttl_seconds: settings.user_ttl.as_secs(),
            operation_timeout_ms: settings.operation_timeout.as_millis() as u64,
            memory_capacity: settings.memory_capacity.get(),
        }
    }
}

impl CacheConfig {
    pub fn global_ttl(&self) -> Duration {
        Duration::from_secs(self.global_ttl_seconds)
    }

    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_seconds)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
