//! Moderation API endpoints
//!
//! - GET /api/v1/moderation/table - The canonical transition and edit tables
//! - GET /api/v1/{kind}/{id}/moderation - Status, editability and offered transitions
//! - POST /api/v1/{kind}/{id}/transition - Move an item to another status
//!
//! Back-office screens render buttons from `/moderation` and post the chosen
//! target back. A stale screen that offers a transition the user no longer
//! has gets `403 ILLEGAL_TRANSITION`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;

use crate::api::content::parse_kind;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ContentItemResponse, ModerationResponse, WorkflowTableResponse};
use crate::models::ContentStatus;
use crate::moderation::{EDIT_RIGHTS, TRANSITIONS};

/// Request body for a transition
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Target status
    pub status: String,
}

/// GET /api/v1/moderation/table
pub async fn get_workflow_table() -> Json<WorkflowTableResponse> {
    Json(WorkflowTableResponse {
        transitions: TRANSITIONS,
        edit_rights: EDIT_RIGHTS,
    })
}

/// GET /api/v1/{kind}/{id}/moderation
pub async fn get_moderation(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ModerationResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let view = state.moderation_service.inspect(kind, id, &user).await?;
    Ok(Json(view.into()))
}

/// POST /api/v1/{kind}/{id}/transition
pub async fn transition_content(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((kind, id)): Path<(String, i64)>,
    body: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<Json<ContentItemResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let Json(body) = body?;
    let target: ContentStatus = body
        .status
        .parse()
        .map_err(|_| ApiError::validation_error(format!("Invalid status: {}", body.status)))?;

    let item = state
        .moderation_service
        .transition(kind, id, target, &user)
        .await?;
    Ok(Json(item.into()))
}
