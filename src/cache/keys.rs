//! Cache key derivation.
//!
//! A listing's key is a pure function of its query shape, so every process
//! sharing the backend agrees on what to read and what to delete.

use std::time::Duration;

use super::config::CacheConfig;

/// Query shape of a cached listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingScope {
    /// Newest posts across all users.
    Global,
    /// Every post owned by one username.
    ByUsername(String),
}

impl ListingScope {
    pub fn by_username(username: impl Into<String>) -> Self {
        Self::ByUsername(username.into())
    }

    /// Scope-relative key: `all` or `user:<username>`.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Global => "all".to_string(),
            Self::ByUsername(username) => format!("user:{username}"),
        }
    }

    /// Physical key, namespaced with the configured prefix.
    pub fn storage_key(&self, config: &CacheConfig) -> String {
        format!("{}{}", config.key_prefix, self.cache_key())
    }

    pub fn ttl(&self, config: &CacheConfig) -> Duration {
        match self {
            Self::Global => config.global_ttl(),
            Self::ByUsername(_) => config.user_ttl(),
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::ByUsername(_) => "user",
        }
    }
}
