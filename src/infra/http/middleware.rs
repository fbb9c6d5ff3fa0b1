use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const MAX_FORWARDED_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Adopt the caller's `x-request-id` when it is sane, mint one otherwise, and
/// echo it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_FORWARDED_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// One line per request: `debug` on success, `warn` for 4xx, `error` for 5xx.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if status.is_success() || status.is_redirection() || status.is_informational() {
        debug!(
            target = "pictura::http::response",
            status = status.as_u16(),
            method = %method,
            route = %route,
            elapsed_ms,
            request_id = %request_id,
            "request served",
        );
        return response;
    }

    let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .map(String::as_str)
        .unwrap_or(status.canonical_reason().unwrap_or("no diagnostic available"))
        .to_string();

    if status >= StatusCode::INTERNAL_SERVER_ERROR {
        error!(
            target = "pictura::http::response",
            status = status.as_u16(),
            method = %method,
            route = %route,
            path = %path,
            elapsed_ms,
            source,
            detail = %detail,
            chain = ?messages,
            request_id = %request_id,
            "request failed",
        );
    } else {
        warn!(
            target = "pictura::http::response",
            status = status.as_u16(),
            method = %method,
            route = %route,
            path = %path,
            elapsed_ms,
            source,
            detail = %detail,
            request_id = %request_id,
            "request rejected",
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(set_request_context))
    }

    #[tokio::test]
    async fn forwarded_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/ping")
            .header(&REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .expect("request");

        let response = app().oneshot(request).await.expect("response");
        assert_eq!(response.headers()[&REQUEST_ID_HEADER], "abc-123");
    }

    #[tokio::test]
    async fn missing_request_id_is_generated() {
        let request = Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .expect("request");

        let response = app().oneshot(request).await.expect("response");
        let id = response.headers()[&REQUEST_ID_HEADER]
            .to_str()
            .expect("ascii id");
        assert!(Uuid::parse_str(id).is_ok());
    }
}
