//! HTTP surface: routing, authentication and response logging.

mod auth;
pub mod error;
mod handlers;
mod middleware;
mod models;
mod state;

pub use error::ApiError;
pub use middleware::RequestContext;
pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: ApiState) -> Router {
    let require_identity =
        axum_middleware::from_fn_with_state(state.clone(), auth::require_identity);

    let create_post = post(handlers::create_post)
        .layer(DefaultBodyLimit::max(state.body_limit))
        .route_layer(require_identity.clone());
    let toggle_like = post(handlers::toggle_like).route_layer(require_identity);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/posts", get(handlers::list_posts).merge(create_post))
        .route("/api/posts/{id}", get(handlers::get_post))
        .route("/api/posts/{id}/like", toggle_like)
        .route("/api/posts/user/{username}", get(handlers::list_user_posts))
        .route("/api/images/{id}", get(handlers::get_image))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
}
