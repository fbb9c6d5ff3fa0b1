#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::{Barrier, Mutex};
use uuid::Uuid;

use pictura::application::identity::{AuthenticatedUser, IdentityError, IdentityVerifier};
use pictura::application::posts::{CreatePostCommand, EngineConfig, PostService, RawImage};
use pictura::application::repos::{
    CreatePostParams, LikeInsert, LikeRemoval, NewObject, ObjectStore, PostsRepo, PostsWriteRepo,
    RepoError, StoredObject,
};
use pictura::cache::{CacheConfig, ListingCache, MemoryReadCache, ReadCache};
use pictura::domain::entities::PostRecord;

#[derive(Default)]
struct LedgerState {
    next_id: i64,
    posts: BTreeMap<i64, PostRecord>,
    likes: HashSet<(i64, i64)>,
}

/// Ledger fake with the same uniqueness guarantees as the `post_likes` table.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    list_calls: Arc<AtomicUsize>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn likes_count(&self, post_id: i64) -> i64 {
        self.state
            .lock()
            .await
            .posts
            .get(&post_id)
            .map(|post| post.likes_count)
            .expect("post exists")
    }

    pub async fn membership_rows(&self, post_id: i64) -> usize {
        self.state
            .lock()
            .await
            .likes
            .iter()
            .filter(|(post, _)| *post == post_id)
            .count()
    }

    pub async fn post_count(&self) -> usize {
        self.state.lock().await.posts.len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn ordered(mut posts: Vec<PostRecord>) -> Vec<PostRecord> {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        posts
    }
}

#[async_trait]
impl PostsRepo for MemoryLedger {
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let posts = self.state.lock().await.posts.values().cloned().collect();
        Ok(Self::ordered(posts)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn list_by_username(&self, username: &str) -> Result<Vec<PostRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let posts = self
            .state
            .lock()
            .await
            .posts
            .values()
            .filter(|post| post.username == username)
            .cloned()
            .collect();
        Ok(Self::ordered(posts))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.state.lock().await.posts.get(&id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryLedger {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            id: state.next_id,
            user_id: params.user_id,
            username: params.username,
            caption: params.caption,
            image_url: params.image_url,
            image_id: params.image_id,
            likes_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn has_like(&self, post_id: i64, user_id: i64) -> Result<bool, RepoError> {
        Ok(self.state.lock().await.likes.contains(&(post_id, user_id)))
    }

    async fn add_like(&self, post_id: i64, user_id: i64) -> Result<LikeInsert, RepoError> {
        let mut state = self.state.lock().await;
        if !state.posts.contains_key(&post_id) {
            return Err(RepoError::NotFound);
        }
        if !state.likes.insert((post_id, user_id)) {
            return Ok(LikeInsert::AlreadyPresent);
        }
        if let Some(post) = state.posts.get_mut(&post_id) {
            post.likes_count += 1;
        }
        Ok(LikeInsert::Inserted)
    }

    async fn remove_like(&self, post_id: i64, user_id: i64) -> Result<LikeRemoval, RepoError> {
        let mut state = self.state.lock().await;
        if !state.likes.remove(&(post_id, user_id)) {
            return Ok(LikeRemoval::AlreadyAbsent);
        }
        if let Some(post) = state.posts.get_mut(&post_id) {
            post.likes_count = (post.likes_count - 1).max(0);
        }
        Ok(LikeRemoval::Removed)
    }
}

/// Holds every `has_like` caller until `parties` of them have read the
/// membership, so they all act on the same starting state.
pub struct GatedLedger {
    inner: MemoryLedger,
    barrier: Barrier,
}

impl GatedLedger {
    pub fn new(inner: MemoryLedger, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl PostsRepo for GatedLedger {
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        self.inner.list_recent(limit).await
    }

    async fn list_by_username(&self, username: &str) -> Result<Vec<PostRecord>, RepoError> {
        self.inner.list_by_username(username).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        self.inner.find_by_id(id).await
    }
}

#[async_trait]
impl PostsWriteRepo for GatedLedger {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.inner.create_post(params).await
    }

    async fn has_like(&self, post_id: i64, user_id: i64) -> Result<bool, RepoError> {
        let exists = self.inner.has_like(post_id, user_id).await?;
        self.barrier.wait().await;
        Ok(exists)
    }

    async fn add_like(&self, post_id: i64, user_id: i64) -> Result<LikeInsert, RepoError> {
        self.inner.add_like(post_id, user_id).await
    }

    async fn remove_like(&self, post_id: i64, user_id: i64) -> Result<LikeRemoval, RepoError> {
        self.inner.remove_like(post_id, user_id).await
    }
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<Uuid, StoredObject>>,
}

impl MemoryObjectStore {
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, object: NewObject) -> Result<Uuid, RepoError> {
        let id = Uuid::new_v4();
        self.objects.lock().await.insert(
            id,
            StoredObject {
                bytes: object.bytes,
                content_type: object.content_type,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredObject>, RepoError> {
        Ok(self.objects.lock().await.get(&id).cloned())
    }
}

/// Object store whose backend is down.
pub struct FailingObjectStore;

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn put(&self, _object: NewObject) -> Result<Uuid, RepoError> {
        Err(RepoError::from_persistence("disk unavailable"))
    }

    async fn get(&self, _id: Uuid) -> Result<Option<StoredObject>, RepoError> {
        Err(RepoError::from_persistence("disk unavailable"))
    }
}

/// Object store that never answers.
pub struct StalledObjectStore;

#[async_trait]
impl ObjectStore for StalledObjectStore {
    async fn put(&self, _object: NewObject) -> Result<Uuid, RepoError> {
        std::future::pending().await
    }

    async fn get(&self, _id: Uuid) -> Result<Option<StoredObject>, RepoError> {
        std::future::pending().await
    }
}

/// Accepts `token-<id>-<username>` credentials.
pub struct StaticIdentity;

#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let rest = token
            .strip_prefix("token-")
            .ok_or(IdentityError::Rejected { status: 401 })?;
        let (id, username) = rest
            .split_once('-')
            .ok_or(IdentityError::Rejected { status: 401 })?;
        let user_id = id
            .parse()
            .map_err(|_| IdentityError::Rejected { status: 401 })?;
        Ok(AuthenticatedUser {
            user_id,
            username: username.to_string(),
        })
    }
}

pub fn user(user_id: i64, username: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id,
        username: username.to_string(),
    }
}

pub fn jpeg_image() -> RawImage {
    RawImage {
        filename: "photo.jpg".to_string(),
        content_type: Some("image/jpeg".to_string()),
        bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']),
    }
}

pub fn create_command(author: AuthenticatedUser, caption: &str) -> CreatePostCommand {
    CreatePostCommand {
        author,
        caption: caption.to_string(),
        image: Some(jpeg_image()),
    }
}

pub fn memory_cache() -> ListingCache {
    let config = CacheConfig::default();
    let store: Arc<dyn ReadCache> = Arc::new(MemoryReadCache::new(&config));
    ListingCache::new(store, config)
}

pub fn engine<L>(ledger: Arc<L>, objects: Arc<dyn ObjectStore>) -> PostService
where
    L: PostsRepo + PostsWriteRepo + 'static,
{
    engine_with(ledger, objects, memory_cache(), EngineConfig::default())
}

pub fn engine_with<L>(
    ledger: Arc<L>,
    objects: Arc<dyn ObjectStore>,
    cache: ListingCache,
    config: EngineConfig,
) -> PostService
where
    L: PostsRepo + PostsWriteRepo + 'static,
{
    PostService::new(ledger.clone(), ledger, objects, cache, config)
}

pub fn short_timeouts() -> EngineConfig {
    EngineConfig {
        store_timeout: Duration::from_millis(200),
        ..EngineConfig::default()
    }
}
