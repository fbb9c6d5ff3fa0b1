//! Pictura read cache.
//!
//! Listings (`all`, `user:<name>`) are cached as serialized post snapshots
//! with a per-scope TTL:
//!
//! - **Population** happens lazily when a read misses.
//! - **Invalidation** deletes entries and never rewrites them in place.
//!
//! Every operation here is best-effort. A failing cache only costs latency,
//! never correctness, because the ledger stays authoritative.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! redis_url = "redis://127.0.0.1:6379"
//! key_prefix = "posts:"
//! global_ttl_seconds = 300
//! user_ttl_seconds = 120
//! ```
//!
//! Without `redis_url` an in-process [`MemoryReadCache`] is used.

mod config;
mod keys;
mod listing;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::ListingScope;
pub use listing::{
    CacheLookup, ListingCache, METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_HIT_TOTAL,
    METRIC_CACHE_INVALIDATION_FAILED_TOTAL, METRIC_CACHE_MISS_TOTAL,
};
pub use store::{CacheError, MemoryReadCache, ReadCache};
