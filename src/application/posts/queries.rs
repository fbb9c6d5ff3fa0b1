use uuid::Uuid;

use crate::application::repos::StoredObject;
use crate::cache::{CacheLookup, ListingScope};
use crate::domain::entities::PostRecord;

use super::service::PostService;
use super::types::PostServiceError;

impl PostService {
    /// Read-through listing: cached copy when present, ledger otherwise.
    pub async fn list_posts(
        &self,
        scope: &ListingScope,
    ) -> Result<Vec<PostRecord>, PostServiceError> {
        if let CacheLookup::Hit(posts) = self.cache.lookup(scope).await {
            return Ok(posts);
        }

        let posts = match scope {
            ListingScope::Global => {
                self.ledger(
                    "list_recent",
                    self.reader.list_recent(self.config.global_listing_limit),
                )
                .await?
            }
            ListingScope::ByUsername(username) => {
                self.ledger("list_by_username", self.reader.list_by_username(username))
                    .await?
            }
        };

        self.cache.populate(scope, &posts).await;
        Ok(posts)
    }

    /// Single post straight from the ledger.
    pub async fn get_post(&self, post_id: i64) -> Result<PostRecord, PostServiceError> {
        self.ledger("find_post", self.reader.find_by_id(post_id))
            .await?
            .ok_or_else(|| PostServiceError::not_found("post"))
    }

    pub async fn get_image(&self, image_id: Uuid) -> Result<StoredObject, PostServiceError> {
        self.object_store("get", self.objects.get(image_id))
            .await?
            .ok_or_else(|| PostServiceError::not_found("image"))
    }
}
