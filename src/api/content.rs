//! Content API endpoints
//!
//! Handles HTTP requests for hikes, passes, articles and news:
//! - GET /api/v1/{kind}/{id} - Read an item (published only for non-staff)
//! - POST /api/v1/{kind} - Create a draft, or submit it for review
//! - PUT /api/v1/{kind}/{id} - Edit an item, if its status allows it
//!
//! `{kind}` is one of `hikes`, `passes`, `articles`, `news`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, OptionalUser};
use crate::api::responses::ContentItemResponse;
use crate::models::{ContentEditInput, ContentKind, CreateContentInput};

/// Resolve the `{kind}` path segment
pub(crate) fn parse_kind(segment: &str) -> Result<ContentKind, ApiError> {
    ContentKind::from_path_segment(segment)
        .ok_or_else(|| ApiError::not_found(format!("Unknown content collection: {}", segment)))
}

/// GET /api/v1/{kind}/{id}
pub async fn get_content(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ContentItemResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let item = state
        .moderation_service
        .get_visible(kind, id, user.as_ref())
        .await?;
    Ok(Json(item.into()))
}

/// POST /api/v1/{kind}
pub async fn create_content(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(kind): Path<String>,
    body: Result<Json<CreateContentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ContentItemResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    let Json(input) = body?;
    let item = state.moderation_service.create(kind, input, &user).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// PUT /api/v1/{kind}/{id}
pub async fn update_content(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((kind, id)): Path<(String, i64)>,
    body: Result<Json<ContentEditInput>, JsonRejection>,
) -> Result<Json<ContentItemResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let Json(input) = body?;
    let item = state
        .moderation_service
        .update_content(kind, id, input, &user)
        .await?;
    Ok(Json(item.into()))
}
