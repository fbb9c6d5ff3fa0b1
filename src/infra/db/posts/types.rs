use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) caption: String,
    pub(crate) image_id: Uuid,
    pub(crate) image_url: String,
    pub(crate) likes_count: i64,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            caption: row.caption,
            image_url: row.image_url,
            image_id: row.image_id,
            likes_count: row.likes_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
