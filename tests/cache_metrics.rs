mod support;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;

use pictura::application::posts::{EngineConfig, METRIC_LIKE_RACE_ABSORBED_TOTAL};
use pictura::cache::{
    CacheConfig, CacheError, ListingCache, ListingScope, METRIC_CACHE_ERROR_TOTAL,
    METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_INVALIDATION_FAILED_TOTAL, METRIC_CACHE_MISS_TOTAL,
    ReadCache,
};

use support::{GatedLedger, MemoryLedger, MemoryObjectStore, create_command, engine, engine_with, user};

/// Backend that refuses every call.
struct DownCache;

#[async_trait]
impl ReadCache for DownCache {
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

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn engine_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Miss then hit on a healthy cache.
    let ledger = Arc::new(MemoryLedger::new());
    let service = engine(ledger.clone(), Arc::new(MemoryObjectStore::default()));
    service
        .list_posts(&ListingScope::Global)
        .await
        .expect("listing");
    service
        .list_posts(&ListingScope::Global)
        .await
        .expect("listing");

    // A broken cache never fails the request.
    let down = ListingCache::new(Arc::new(DownCache), CacheConfig::default());
    let degraded = engine_with(
        ledger.clone(),
        Arc::new(MemoryObjectStore::default()),
        down,
        EngineConfig::default(),
    );
    let post = degraded
        .create_post(create_command(user(1, "alice"), "cache is down"))
        .await
        .expect("create succeeds without cache");
    let listed = degraded
        .list_posts(&ListingScope::by_username("alice"))
        .await
        .expect("listing falls back to ledger");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, post.id);

    // Two callers racing from the same state: one absorbed insert.
    let gated = Arc::new(GatedLedger::new((*ledger).clone(), 2));
    let racing = Arc::new(engine(gated, Arc::new(MemoryObjectStore::default())));
    let post_id = post.id;
    let first = tokio::spawn({
        let racing = racing.clone();
        async move { racing.toggle_like(9, post_id).await }
    });
    let second = tokio::spawn({
        let racing = racing.clone();
        async move { racing.toggle_like(9, post_id).await }
    });
    assert!(first.await.expect("joined").expect("toggle").liked);
    assert!(second.await.expect("joined").expect("toggle").liked);
    assert_eq!(ledger.likes_count(post_id).await, 1);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        METRIC_CACHE_HIT_TOTAL,
        METRIC_CACHE_MISS_TOTAL,
        METRIC_CACHE_ERROR_TOTAL,
        METRIC_CACHE_INVALIDATION_FAILED_TOTAL,
        METRIC_LIKE_RACE_ABSORBED_TOTAL,
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
