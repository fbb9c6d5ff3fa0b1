//! Consistency engine for posts, likes and their cached listings.
//!
//! Ledger and object store calls are fail-fast: a failure or timeout aborts
//! the operation with [`PostServiceError::StoreUnavailable`]. Cache calls go
//! through [`crate::cache::ListingCache`] and never fail an operation.

mod commands;
mod queries;
mod service;
pub mod types;

pub use service::*;
pub use types::{
    CreatePostCommand, EngineConfig, PostServiceError, RawImage, StoreKind, ToggleLikeOutcome,
};
