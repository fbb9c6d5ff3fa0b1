//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A published image post.
///
/// `username` is captured when the post is created and is never re-synced
/// with later identity changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub caption: String,
    pub image_url: String,
    pub image_id: Uuid,
    pub likes_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Metadata describing a stored image blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub stored_path: String,
    pub size_bytes: i64,
    pub checksum: String,
    pub created_at: OffsetDateTime,
}
