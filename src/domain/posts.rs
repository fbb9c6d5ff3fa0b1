//! Post-specific invariants: caption bounds, image links and like membership.

use uuid::Uuid;

use super::error::DomainError;

/// Default upper bound on caption length, counted in characters.
pub const DEFAULT_MAX_CAPTION_CHARS: usize = 1000;

/// Public route prefix under which stored images are served.
pub const IMAGE_ROUTE_PREFIX: &str = "/api/images";

/// Derive the fetch path for a stored image.
pub fn image_url_for(image_id: Uuid) -> String {
    format!("{IMAGE_ROUTE_PREFIX}/{image_id}")
}

/// Reject captions longer than `max_chars` characters. Empty captions are allowed.
pub fn validate_caption(caption: &str, max_chars: usize) -> Result<(), DomainError> {
    let length = caption.chars().count();
    if length > max_chars {
        return Err(DomainError::validation(
            "caption",
            format!("caption has {length} characters, limit is {max_chars}"),
        ));
    }
    Ok(())
}

/// Membership state of a single `(post, user)` like pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    NotLiked,
    Liked,
}

impl LikeState {
    pub fn from_membership(exists: bool) -> Self {
        if exists { Self::Liked } else { Self::NotLiked }
    }

    pub fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }

    /// The state a toggle moves towards.
    pub fn toggled(self) -> Self {
        match self {
            Self::NotLiked => Self::Liked,
            Self::Liked => Self::NotLiked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_at_limit_is_accepted() {
        let caption = "a".repeat(DEFAULT_MAX_CAPTION_CHARS);
        assert!(validate_caption(&caption, DEFAULT_MAX_CAPTION_CHARS).is_ok());
    }

    #[test]
    fn caption_over_limit_is_rejected() {
        let caption = "a".repeat(DEFAULT_MAX_CAPTION_CHARS + 1);
        let err = validate_caption(&caption, DEFAULT_MAX_CAPTION_CHARS)
            .expect_err("caption over limit");
        assert_eq!(err.field(), Some("caption"));
    }

    #[test]
    fn caption_counts_characters_not_bytes() {
        let caption = "é".repeat(DEFAULT_MAX_CAPTION_CHARS);
        assert!(caption.len() > DEFAULT_MAX_CAPTION_CHARS);
        assert!(validate_caption(&caption, DEFAULT_MAX_CAPTION_CHARS).is_ok());
    }

    #[test]
    fn empty_caption_is_accepted() {
        assert!(validate_caption("", DEFAULT_MAX_CAPTION_CHARS).is_ok());
    }

    #[test]
    fn image_url_uses_public_route() {
        let id = Uuid::nil();
        assert_eq!(
            image_url_for(id),
            "/api/images/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn like_state_toggles_between_two_states() {
        assert_eq!(LikeState::from_membership(false), LikeState::NotLiked);
        assert_eq!(LikeState::NotLiked.toggled(), LikeState::Liked);
        assert_eq!(LikeState::Liked.toggled(), LikeState::NotLiked);
        assert!(LikeState::Liked.is_liked());
    }
}
