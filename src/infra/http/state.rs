use std::sync::Arc;

use crate::application::identity::IdentityVerifier;
use crate::application::posts::PostService;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<PostService>,
    pub identity: Arc<dyn IdentityVerifier>,
    /// Multipart body limit; a little above the largest accepted image.
    pub body_limit: usize,
}

impl ApiState {
    pub fn new(posts: Arc<PostService>, identity: Arc<dyn IdentityVerifier>) -> Self {
        let max_image = usize::try_from(posts.config().max_image_bytes).unwrap_or(usize::MAX);
        Self {
            posts,
            identity,
            body_limit: max_image.saturating_add(64 * 1024),
        }
    }
}
