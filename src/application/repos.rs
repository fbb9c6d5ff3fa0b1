//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub user_id: i64,
    pub username: String,
    pub caption: String,
    pub image_id: Uuid,
    pub image_url: String,
}

/// Outcome of inserting a like row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeInsert {
    Inserted,
    /// A row for the pair already existed; the counter was left untouched.
    AlreadyPresent,
}

/// Outcome of deleting a like row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeRemoval {
    Removed,
    /// No row for the pair existed; the counter was left untouched.
    AlreadyAbsent,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Newest posts across all users, `created_at DESC, id ASC`.
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError>;

    /// Every post owned by `username`, same ordering as [`Self::list_recent`].
    async fn list_by_username(&self, username: &str) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn has_like(&self, post_id: i64, user_id: i64) -> Result<bool, RepoError>;

    /// Insert the membership row and bump the counter in one transaction.
    /// The counter only moves when a row was actually inserted.
    async fn add_like(&self, post_id: i64, user_id: i64) -> Result<LikeInsert, RepoError>;

    /// Delete the membership row and decrement the counter, floored at zero.
    async fn remove_like(&self, post_id: i64, user_id: i64) -> Result<LikeRemoval, RepoError>;
}

/// Image payload together with the content type it was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct NewObject {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist a blob and return its opaque id.
    async fn put(&self, object: NewObject) -> Result<Uuid, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredObject>, RepoError>;
}
