use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::error::ApiError;
use super::state::ApiState;

/// Resolve the bearer credential to an `AuthenticatedUser` request extension.
pub async fn require_identity(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(request.headers().get(AUTHORIZATION)) else {
        return ApiError::unauthenticated("Authorization header required").into_response();
    };

    let user = match state.identity.verify(&token).await {
        Ok(user) => user,
        Err(err) => {
            debug!(target = "pictura::http::auth", error = %err, "credential rejected");
            return ApiError::unauthenticated("Invalid token")
                .with_detail(err.to_string())
                .into_response();
        }
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        let value = HeaderValue::from_static("Bearer abc.def");
        assert_eq!(extract_bearer(Some(&value)).as_deref(), Some("abc.def"));
    }

    #[test]
    fn non_bearer_or_empty_is_rejected() {
        assert!(extract_bearer(None).is_none());
        assert!(extract_bearer(Some(&HeaderValue::from_static("Basic xyz"))).is_none());
        assert!(extract_bearer(Some(&HeaderValue::from_static("Bearer   "))).is_none());
    }
}
