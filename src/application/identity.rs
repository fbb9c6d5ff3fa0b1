//! Bearer credential verification contract.

use async_trait::async_trait;
use thiserror::Error;

/// Caller identity established by the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("credential rejected by identity service (status {status})")]
    Rejected { status: u16 },
    #[error("identity service returned an unusable identity: {0}")]
    Malformed(String),
    #[error("identity service unreachable: {0}")]
    Unreachable(String),
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, IdentityError>;
}
