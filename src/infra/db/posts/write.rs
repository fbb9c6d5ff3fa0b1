use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    CreatePostParams, LikeInsert, LikeRemoval, PostsWriteRepo, RepoError,
};
use crate::domain::entities::PostRecord;

use super::super::{POST_COLUMNS, PostgresRepositories, map_sqlx_error};
use super::types::PostRow;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            user_id,
            username,
            caption,
            image_id,
            image_url,
        } = params;

        let now = OffsetDateTime::now_utc();
        let sql = format!(
            "INSERT INTO posts (user_id, username, caption, image_id, image_url, likes_count, \
                                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, 0, $6, $6) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(user_id)
            .bind(username)
            .bind(caption)
            .bind(image_id)
            .bind(image_url)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn has_like(&self, post_id: i64, user_id: i64) -> Result<bool, RepoError> {
        self.like_exists(post_id, user_id).await
    }

    async fn add_like(&self, post_id: i64, user_id: i64) -> Result<LikeInsert, RepoError> {
        self.insert_like(post_id, user_id).await
    }

    async fn remove_like(&self, post_id: i64, user_id: i64) -> Result<LikeRemoval, RepoError> {
        self.delete_like(post_id, user_id).await
    }
}
