//! Like membership rows and the counter they drive.
//!
//! The unique `(post_id, user_id)` constraint decides races; the counter is
//! only ever moved relative to its stored value and only when a membership
//! row actually changed in the same transaction.

use sqlx::query_scalar;
use time::OffsetDateTime;

use crate::application::repos::{LikeInsert, LikeRemoval, RepoError};

use super::super::{PostgresRepositories, map_sqlx_error};

impl PostgresRepositories {
    pub(crate) async fn like_exists(&self, post_id: i64, user_id: i64) -> Result<bool, RepoError> {
        query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM post_likes WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    pub(crate) async fn insert_like(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<LikeInsert, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let inserted = sqlx::query(
            "INSERT INTO post_likes (post_id, user_id, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (post_id, user_id) DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        if inserted == 0 {
            tx.commit().await.map_err(map_sqlx_error)?;
            return Ok(LikeInsert::AlreadyPresent);
        }

        let updated = sqlx::query(
            "UPDATE posts SET likes_count = likes_count + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(post_id)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        if updated == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(LikeInsert::Inserted)
    }

    pub(crate) async fn delete_like(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<LikeRemoval, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let deleted = query_scalar::<_, i64>(
            "DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2 RETURNING id",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if deleted.is_none() {
            tx.commit().await.map_err(map_sqlx_error)?;
            return Ok(LikeRemoval::AlreadyAbsent);
        }

        sqlx::query(
            "UPDATE posts SET likes_count = GREATEST(likes_count - 1, 0), updated_at = $2 \
             WHERE id = $1",
        )
        .bind(post_id)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(LikeRemoval::Removed)
    }
}
