//! Object store for image blobs: bytes on disk, metadata in Postgres.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::repos::{NewObject, ObjectStore, RepoError, StoredObject};
use crate::domain::entities::ImageRecord;

use super::db::PostgresRepositories;
use super::uploads::{UploadStorage, UploadStorageError};

#[derive(Clone)]
pub struct FsObjectStore {
    storage: Arc<UploadStorage>,
    repositories: PostgresRepositories,
}

impl FsObjectStore {
    pub fn new(storage: Arc<UploadStorage>, repositories: PostgresRepositories) -> Self {
        Self {
            storage,
            repositories,
        }
    }
}

fn storage_error(err: UploadStorageError) -> RepoError {
    RepoError::from_persistence(err)
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, object: NewObject) -> Result<Uuid, RepoError> {
        let NewObject {
            filename,
            content_type,
            bytes,
        } = object;

        let stored = self
            .storage
            .store(&filename, bytes)
            .await
            .map_err(storage_error)?;

        let record = ImageRecord {
            id: Uuid::new_v4(),
            filename,
            content_type,
            stored_path: stored.stored_path,
            size_bytes: stored.size_bytes,
            checksum: stored.checksum,
            created_at: OffsetDateTime::now_utc(),
        };

        if let Err(err) = self.repositories.insert_image(&record).await {
            if let Err(cleanup) = self.storage.delete(&record.stored_path).await {
                warn!(
                    target = "pictura::images",
                    stored_path = %record.stored_path,
                    error = %cleanup,
                    "failed to remove blob after metadata insert failed"
                );
            }
            return Err(err);
        }

        Ok(record.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredObject>, RepoError> {
        let Some(record) = self.repositories.find_image(id).await? else {
            return Ok(None);
        };

        match self.storage.read(&record.stored_path).await {
            Ok(bytes) => Ok(Some(StoredObject {
                bytes,
                content_type: record.content_type,
            })),
            Err(UploadStorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                error!(
                    target = "pictura::images",
                    image_id = %id,
                    stored_path = %record.stored_path,
                    "image metadata present but blob missing"
                );
                Ok(None)
            }
            Err(err) => Err(storage_error(err)),
        }
    }
}
