use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::application::identity::AuthenticatedUser;
use crate::domain::error::DomainError;
use crate::domain::posts::DEFAULT_MAX_CAPTION_CHARS;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_GLOBAL_LISTING_LIMIT: u32 = 50;
const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Tunables for [`super::PostService`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on a single ledger or object store call.
    pub store_timeout: Duration,
    pub global_listing_limit: u32,
    pub max_caption_chars: usize,
    pub max_image_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            global_listing_limit: DEFAULT_GLOBAL_LISTING_LIMIT,
            max_caption_chars: DEFAULT_MAX_CAPTION_CHARS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl From<&crate::config::Settings> for EngineConfig {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            store_timeout: settings.engine.store_timeout,
            global_listing_limit: settings.engine.global_listing_limit.get(),
            max_caption_chars: settings.engine.max_caption_chars.get() as usize,
            max_image_bytes: settings.uploads.max_image_bytes.get(),
        }
    }
}

/// Backing store a failed call was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Ledger,
    ObjectStore,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::ObjectStore => "object_store",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error(transparent)]
    Validation(DomainError),
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("{store} unavailable: {detail}")]
    StoreUnavailable { store: StoreKind, detail: String },
}

impl PostServiceError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn store_unavailable(store: StoreKind, detail: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store,
            detail: detail.into(),
        }
    }
}

impl From<DomainError> for PostServiceError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NotFound { entity } => Self::NotFound { entity },
            other @ DomainError::Validation { .. } => Self::Validation(other),
        }
    }
}

/// Image part as received, before validation.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub author: AuthenticatedUser,
    pub caption: String,
    pub image: Option<RawImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleLikeOutcome {
    pub liked: bool,
}
