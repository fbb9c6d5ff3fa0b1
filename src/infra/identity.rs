//! Identity verification against the user service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use crate::application::identity::{AuthenticatedUser, IdentityError, IdentityVerifier};

use super::error::InfraError;

const VALIDATE_PATH: &str = "/api/users/validate";

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    #[serde(rename = "userId")]
    user_id: Option<serde_json::Number>,
    username: Option<String>,
}

impl ValidateResponse {
    fn into_user(self) -> Result<AuthenticatedUser, IdentityError> {
        let user_id = self
            .user_id
            .as_ref()
            .and_then(number_as_id)
            .filter(|id| *id > 0)
            .ok_or_else(|| IdentityError::Malformed("missing or non-positive userId".into()))?;
        let username = self
            .username
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| IdentityError::Malformed("missing username".into()))?;
        Ok(AuthenticatedUser { user_id, username })
    }
}

/// JSON numbers may arrive as `42` or `42.0`; fractional ids are rejected.
fn number_as_id(number: &serde_json::Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.fract() == 0.0 && *value <= i64::MAX as f64)
            .map(|value| value as i64)
    })
}

#[derive(Clone, Debug)]
pub struct HttpIdentityVerifier {
    client: Client,
    validate_url: String,
    timeout: Duration,
}

impl HttpIdentityVerifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("pictura/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build identity client: {err}"))
            })?;
        let validate_url = format!("{}{VALIDATE_PATH}", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            validate_url,
            timeout,
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let response = self
            .client
            .get(&self.validate_url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| IdentityError::Unreachable(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(
                target = "pictura::identity",
                status = status.as_u16(),
                "identity service rejected credential"
            );
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: ValidateResponse = response
            .json()
            .await
            .map_err(|err| IdentityError::Malformed(err.to_string()))?;
        body.into_user()
    }
}
