use std::future::Future;
use std::sync::Arc;

use tracing::error;

use crate::application::repos::{ObjectStore, PostsRepo, PostsWriteRepo, RepoError};
use crate::cache::ListingCache;

use super::types::{EngineConfig, PostServiceError, StoreKind};

pub const METRIC_LIKE_RACE_ABSORBED_TOTAL: &str = "pictura_like_race_absorbed_total";

#[derive(Clone)]
pub struct PostService {
    pub(crate) reader: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) objects: Arc<dyn ObjectStore>,
    pub(crate) cache: ListingCache,
    pub(crate) config: EngineConfig,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        objects: Arc<dyn ObjectStore>,
        cache: ListingCache,
        config: EngineConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            objects,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a ledger call under the store timeout.
    ///
    /// `NotFound` from the ledger only arises from a missing post.
    pub(crate) async fn ledger<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, RepoError>>,
    ) -> Result<T, PostServiceError> {
        match self.bounded(StoreKind::Ledger, op, call).await? {
            Ok(value) => Ok(value),
            Err(RepoError::NotFound) => Err(PostServiceError::not_found("post")),
            Err(err) => Err(store_failure(StoreKind::Ledger, op, &err)),
        }
    }

    /// Run an object store call under the store timeout.
    pub(crate) async fn object_store<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, RepoError>>,
    ) -> Result<T, PostServiceError> {
        match self.bounded(StoreKind::ObjectStore, op, call).await? {
            Ok(value) => Ok(value),
            Err(RepoError::NotFound) => Err(PostServiceError::not_found("image")),
            Err(err) => Err(store_failure(StoreKind::ObjectStore, op, &err)),
        }
    }

    async fn bounded<T>(
        &self,
        store: StoreKind,
        op: &'static str,
        call: impl Future<Output = Result<T, RepoError>>,
    ) -> Result<Result<T, RepoError>, PostServiceError> {
        tokio::time::timeout(self.config.store_timeout, call)
            .await
            .map_err(|_| {
                error!(
                    target = "pictura::engine",
                    store = store.as_str(),
                    op,
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    "store call timed out"
                );
                PostServiceError::store_unavailable(store, format!("{op} timed out"))
            })
    }
}

fn store_failure(store: StoreKind, op: &'static str, err: &RepoError) -> PostServiceError {
    error!(
        target = "pictura::engine",
        store = store.as_str(),
        op,
        error = %err,
        "store call failed"
    );
    PostServiceError::store_unavailable(store, format!("{op}: {err}"))
}
