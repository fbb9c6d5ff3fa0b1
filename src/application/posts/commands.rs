use metrics::counter;
use tracing::{debug, info};

use crate::application::repos::{CreatePostParams, LikeInsert, LikeRemoval, NewObject};
use crate::cache::ListingScope;
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::domain::images::ImageUpload;
use crate::domain::posts::{LikeState, image_url_for, validate_caption};

use super::service::{METRIC_LIKE_RACE_ABSORBED_TOTAL, PostService};
use super::types::{CreatePostCommand, PostServiceError, ToggleLikeOutcome};

impl PostService {
    /// Store the image, record the post, then drop the listings it belongs to.
    ///
    /// Nothing is written when validation fails. A ledger failure after the
    /// image was stored leaves an unreferenced blob behind.
    pub async fn create_post(
        &self,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostServiceError> {
        let CreatePostCommand {
            author,
            caption,
            image,
        } = command;

        let raw = image.ok_or_else(|| DomainError::validation("image", "image file is required"))?;
        let upload = ImageUpload::new(
            &raw.filename,
            raw.content_type.as_deref(),
            raw.bytes,
            self.config.max_image_bytes,
        )?;
        validate_caption(&caption, self.config.max_caption_chars)?;

        let (filename, content_type, bytes) = upload.into_parts();
        let image_id = self
            .object_store(
                "put",
                self.objects.put(NewObject {
                    filename,
                    content_type,
                    bytes,
                }),
            )
            .await?;

        let params = CreatePostParams {
            user_id: author.user_id,
            username: author.username.clone(),
            caption,
            image_id,
            image_url: image_url_for(image_id),
        };
        let post = self
            .ledger("create_post", self.writer.create_post(params))
            .await?;

        self.cache
            .invalidate(&[
                ListingScope::Global,
                ListingScope::by_username(&author.username),
            ])
            .await;

        info!(
            target = "pictura::engine",
            post_id = post.id,
            user_id = post.user_id,
            image_id = %post.image_id,
            "post created"
        );
        Ok(post)
    }

    /// Flip the caller's like on a post and report the resulting membership.
    ///
    /// Concurrent toggles from the same starting state converge: the ledger's
    /// unique `(post_id, user_id)` pair admits one insert or delete and the
    /// losers observe `AlreadyPresent` or `AlreadyAbsent` without touching
    /// the counter.
    pub async fn toggle_like(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> Result<ToggleLikeOutcome, PostServiceError> {
        self.ledger("find_post", self.reader.find_by_id(post_id))
            .await?
            .ok_or_else(|| PostServiceError::not_found("post"))?;

        let current = LikeState::from_membership(
            self.ledger("has_like", self.writer.has_like(post_id, user_id))
                .await?,
        );

        let next = match current {
            LikeState::NotLiked => {
                match self
                    .ledger("add_like", self.writer.add_like(post_id, user_id))
                    .await?
                {
                    LikeInsert::Inserted => {}
                    LikeInsert::AlreadyPresent => absorbed_race(post_id, user_id, "add_like"),
                }
                current.toggled()
            }
            LikeState::Liked => {
                match self
                    .ledger("remove_like", self.writer.remove_like(post_id, user_id))
                    .await?
                {
                    LikeRemoval::Removed => {}
                    LikeRemoval::AlreadyAbsent => {
                        absorbed_race(post_id, user_id, "remove_like")
                    }
                }
                current.toggled()
            }
        };

        // Per-user listings also carry likes_count but are left to expire.
        self.cache.invalidate(&[ListingScope::Global]).await;

        debug!(
            target = "pictura::engine",
            post_id,
            user_id,
            liked = next.is_liked(),
            "like toggled"
        );
        Ok(ToggleLikeOutcome {
            liked: next.is_liked(),
        })
    }
}

fn absorbed_race(post_id: i64, user_id: i64, op: &'static str) {
    counter!(METRIC_LIKE_RACE_ABSORBED_TOTAL, "op" => op).increment(1);
    debug!(
        target = "pictura::engine",
        post_id, user_id, op, "concurrent toggle already applied; counter untouched"
    );
}
