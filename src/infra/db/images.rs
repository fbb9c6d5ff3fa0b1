use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::entities::ImageRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    filename: String,
    content_type: String,
    stored_path: String,
    size_bytes: i64,
    checksum: String,
    created_at: OffsetDateTime,
}

impl From<ImageRow> for ImageRecord {
    fn from(row: ImageRow) -> Self {
        Self {
            id: row.id,
            filename: row.filename,
            content_type: row.content_type,
            stored_path: row.stored_path,
            size_bytes: row.size_bytes,
            checksum: row.checksum,
            created_at: row.created_at,
        }
    }
}

impl PostgresRepositories {
    pub async fn insert_image(&self, record: &ImageRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO images (id, filename, content_type, stored_path, size_bytes, checksum, \
                                 created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.id)
        .bind(&record.filename)
        .bind(&record.content_type)
        .bind(&record.stored_path)
        .bind(record.size_bytes)
        .bind(&record.checksum)
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    pub async fn find_image(&self, id: Uuid) -> Result<Option<ImageRecord>, RepoError> {
        let row = sqlx::query_as::<_, ImageRow>(
            "SELECT id, filename, content_type, stored_path, size_bytes, checksum, created_at \
             FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ImageRecord::from))
    }
}
