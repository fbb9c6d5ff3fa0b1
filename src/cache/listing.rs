//! Typed, best-effort access to cached post listings.
//!
//! None of these methods return errors. Backend failures, timeouts and
//! undecodable payloads are logged, counted and reported as a miss or a
//! failed invalidation. The ledger stays the source of truth.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::entities::PostRecord;

use super::config::CacheConfig;
use super::keys::ListingScope;
use super::store::{CacheError, ReadCache};

pub const METRIC_CACHE_HIT_TOTAL: &str = "pictura_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "pictura_cache_miss_total";
pub const METRIC_CACHE_ERROR_TOTAL: &str = "pictura_cache_error_total";
pub const METRIC_CACHE_INVALIDATION_FAILED_TOTAL: &str = "pictura_cache_invalidation_failed_total";

/// Result of consulting the cache for a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Vec<PostRecord>),
    Miss,
}

#[derive(Clone)]
pub struct ListingCache {
    store: Arc<dyn ReadCache>,
    config: CacheConfig,
}

impl ListingCache {
    pub fn new(store: Arc<dyn ReadCache>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read a listing. Anything other than a decodable hit is a miss.
    pub async fn lookup(&self, scope: &ListingScope) -> CacheLookup {
        let key = scope.storage_key(&self.config);
        let raw = match self.bounded(self.store.get(&key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS_TOTAL, "scope" => scope.kind()).increment(1);
                return CacheLookup::Miss;
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "get").increment(1);
                warn!(
                    target = "pictura::cache",
                    key = %key,
                    error = %err,
                    "cache read failed; falling back to ledger"
                );
                return CacheLookup::Miss;
            }
        };

        match serde_json::from_slice::<Vec<PostRecord>>(&raw) {
            Ok(posts) => {
                counter!(METRIC_CACHE_HIT_TOTAL, "scope" => scope.kind()).increment(1);
                debug!(target = "pictura::cache", key = %key, count = posts.len(), "cache hit");
                CacheLookup::Hit(posts)
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "decode").increment(1);
                warn!(
                    target = "pictura::cache",
                    key = %key,
                    error = %err,
                    "discarding undecodable cache entry"
                );
                self.invalidate(std::slice::from_ref(scope)).await;
                CacheLookup::Miss
            }
        }
    }

    /// Store a listing under its scope's TTL. Returns whether the write landed.
    pub async fn populate(&self, scope: &ListingScope, posts: &[PostRecord]) -> bool {
        let key = scope.storage_key(&self.config);
        let payload = match serde_json::to_vec(posts) {
            Ok(payload) => payload,
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "encode").increment(1);
                warn!(target = "pictura::cache", key = %key, error = %err, "failed to encode listing");
                return false;
            }
        };

        let ttl = scope.ttl(&self.config);
        match self.bounded(self.store.set(&key, payload, ttl)).await {
            Ok(()) => {
                debug!(
                    target = "pictura::cache",
                    key = %key,
                    ttl_secs = ttl.as_secs(),
                    count = posts.len(),
                    "listing cached"
                );
                true
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "set").increment(1);
                warn!(target = "pictura::cache", key = %key, error = %err, "cache write failed");
                false
            }
        }
    }

    /// Delete the listings for `scopes`. Failures are logged and swallowed;
    /// the return value only reports whether the delete landed.
    pub async fn invalidate(&self, scopes: &[ListingScope]) -> bool {
        if scopes.is_empty() {
            return true;
        }
        let keys: Vec<String> = scopes
            .iter()
            .map(|scope| scope.storage_key(&self.config))
            .collect();

        match self.bounded(self.store.delete(&keys)).await {
            Ok(()) => {
                debug!(target = "pictura::cache", keys = ?keys, "listings invalidated");
                true
            }
            Err(err) => {
                counter!(METRIC_CACHE_INVALIDATION_FAILED_TOTAL).increment(1);
                warn!(
                    target = "pictura::cache",
                    keys = ?keys,
                    error = %err,
                    "cache invalidation failed; entries stay stale until their TTL"
                );
                false
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.config.operation_timeout(), operation).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::cache::MemoryReadCache;

    fn sample_post(id: i64, username: &str) -> PostRecord {
        let now = OffsetDateTime::now_utc();
        PostRecord {
            id,
            user_id: 7,
            username: username.to_string(),
            caption: "hello".to_string(),
            image_url: "/api/images/00000000-0000-0000-0000-000000000000".to_string(),
            image_id: Uuid::nil(),
            likes_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl ReadCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn delete(&self, _keys: &[String]) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }
    }

    struct StalledCache;

    #[async_trait]
    impl ReadCache for StalledCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            futures::future::pending().await
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            futures::future::pending().await
        }

        async fn delete(&self, _keys: &[String]) -> Result<(), CacheError> {
            futures::future::pending().await
        }
    }

    fn memory_listing() -> (Arc<MemoryReadCache>, ListingCache) {
        let config = CacheConfig::default();
        let store = Arc::new(MemoryReadCache::new(&config));
        let listing = ListingCache::new(store.clone(), config);
        (store, listing)
    }

    #[tokio::test]
    async fn populate_then_lookup_hits() {
        let (_, listing) = memory_listing();
        let posts = vec![sample_post(2, "alice"), sample_post(1, "alice")];

        assert_eq!(listing.lookup(&ListingScope::Global).await, CacheLookup::Miss);
        assert!(listing.populate(&ListingScope::Global, &posts).await);
        assert_eq!(
            listing.lookup(&ListingScope::Global).await,
            CacheLookup::Hit(posts)
        );
    }

    #[tokio::test]
    async fn empty_listing_is_a_hit() {
        let (_, listing) = memory_listing();
        let scope = ListingScope::by_username("nobody");
        assert!(listing.populate(&scope, &[]).await);
        assert_eq!(listing.lookup(&scope).await, CacheLookup::Hit(Vec::new()));
    }

    #[tokio::test]
    async fn invalidate_removes_only_named_scopes() {
        let (_, listing) = memory_listing();
        let user = ListingScope::by_username("alice");
        listing.populate(&ListingScope::Global, &[]).await;
        listing.populate(&user, &[]).await;

        assert!(listing.invalidate(&[ListingScope::Global]).await);

        assert_eq!(listing.lookup(&ListingScope::Global).await, CacheLookup::Miss);
        assert_eq!(listing.lookup(&user).await, CacheLookup::Hit(Vec::new()));
    }

    #[tokio::test]
    async fn corrupt_entry_is_treated_as_miss_and_dropped() {
        let (store, listing) = memory_listing();
        store
            .set("posts:all", b"not json".to_vec(), Duration::from_secs(60))
            .await
            .expect("set");

        assert_eq!(listing.lookup(&ListingScope::Global).await, CacheLookup::Miss);
        assert!(store.get("posts:all").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn backend_errors_degrade_to_miss() {
        let listing = ListingCache::new(Arc::new(BrokenCache), CacheConfig::default());
        assert_eq!(listing.lookup(&ListingScope::Global).await, CacheLookup::Miss);
        assert!(!listing.populate(&ListingScope::Global, &[]).await);
        assert!(!listing.invalidate(&[ListingScope::Global]).await);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_backend_is_bounded_by_timeout() {
        let listing = ListingCache::new(Arc::new(StalledCache), CacheConfig::default());
        assert_eq!(listing.lookup(&ListingScope::Global).await, CacheLookup::Miss);
        assert!(!listing.invalidate(&[ListingScope::Global]).await);
    }
}
