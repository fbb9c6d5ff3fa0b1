//! Post, like and image handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Extension, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::identity::AuthenticatedUser;
use crate::application::posts::{CreatePostCommand, RawImage};
use crate::cache::ListingScope;

use super::error::ApiError;
use super::models::{HealthResponse, LikeResponse};
use super::state::ApiState;

const IMAGE_FIELD: &str = "image";
const CAPTION_FIELD: &str = "caption";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        service: "posts-service",
        timestamp: OffsetDateTime::now_utc(),
    })
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(author): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart?;
    let mut caption = String::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ApiError::validation("Invalid multipart payload").with_detail(err.to_string())
    })? {
        match field.name() {
            Some(IMAGE_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|err| {
                    ApiError::validation("Failed to read image").with_detail(err.to_string())
                })?;
                image = Some(RawImage {
                    filename,
                    content_type,
                    bytes,
                });
            }
            Some(CAPTION_FIELD) => {
                caption = field.text().await.map_err(|err| {
                    ApiError::validation("Failed to read caption").with_detail(err.to_string())
                })?;
            }
            _ => {}
        }
    }

    let post = state
        .posts
        .create_post(CreatePostCommand {
            author,
            caption,
            image,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_posts(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.list_posts(&ListingScope::Global).await?;
    Ok(Json(posts))
}

pub async fn list_user_posts(
    State(state): State<ApiState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .posts
        .list_posts(&ListingScope::by_username(username))
        .await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get_post(parse_post_id(&id)?).await?;
    Ok(Json(post))
}

pub async fn toggle_like(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .posts
        .toggle_like(user.user_id, parse_post_id(&id)?)
        .await?;
    Ok(Json(LikeResponse {
        liked: outcome.liked,
    }))
}

pub async fn get_image(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let image_id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("Image not found"))?;
    let object = state.posts.get_image(image_id).await?;

    let length = object.bytes.len();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, object.content_type)
        .header(header::CONTENT_LENGTH, length)
        .body(Body::from(object.bytes))
        .map_err(|err| ApiError::store_unavailable().with_detail(err.to_string()))
}

fn parse_post_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation("Post id must be a positive integer"))
}
