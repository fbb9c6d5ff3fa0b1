use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::posts::PostServiceError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
}

pub mod codes {
    pub const UNAUTHENTICATED: &str = "unauthenticated";
    pub const VALIDATION: &str = "validation_error";
    pub const NOT_FOUND: &str = "not_found";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
}

/// Error body returned by every route. `detail` only reaches the logs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn unauthenticated(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHENTICATED, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::VALIDATION, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }

    pub fn store_unavailable() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::STORE_UNAVAILABLE,
            "Service temporarily unavailable",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<PostServiceError> for ApiError {
    fn from(error: PostServiceError) -> Self {
        match error {
            PostServiceError::Validation(err) => ApiError::validation(err.to_string()),
            PostServiceError::NotFound { entity } => {
                let message = match entity {
                    "image" => "Image not found",
                    _ => "Post not found",
                };
                ApiError::not_found(message)
            }
            err @ PostServiceError::StoreUnavailable { .. } => {
                ApiError::store_unavailable().with_detail(err.to_string())
            }
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::validation("Invalid multipart payload").with_detail(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.clone(),
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::error",
            self.status,
            format!(
                "{}: {}",
                self.code,
                self.detail.as_deref().unwrap_or(&self.message)
            ),
        )
        .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::posts::StoreKind;
    use crate::domain::error::DomainError;

    #[test]
    fn engine_errors_map_to_documented_statuses() {
        let validation: ApiError =
            PostServiceError::from(DomainError::validation("caption", "too long")).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.code(), codes::VALIDATION);

        let missing: ApiError = PostServiceError::not_found("post").into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), codes::NOT_FOUND);

        let down: ApiError =
            PostServiceError::store_unavailable(StoreKind::Ledger, "pool closed").into();
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(down.code(), codes::STORE_UNAVAILABLE);
    }

    #[test]
    fn store_detail_stays_out_of_the_body() {
        let response: Response =
            ApiError::from(PostServiceError::store_unavailable(StoreKind::Ledger, "secret dsn"))
                .into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert!(report.messages[0].contains("secret dsn"));
    }
}
