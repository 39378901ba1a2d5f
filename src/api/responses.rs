//! Shared API response types
//!
//! Response structures used across the content and moderation endpoints.

use serde::Serialize;

use crate::models::ContentItem;
use crate::moderation::{EditRule, TransitionOption, TransitionRule};
use crate::services::ModerationView;

/// Content item as returned to the front end
#[derive(Debug, Serialize)]
pub struct ContentItemResponse {
    pub id: i64,
    pub kind: String,
    pub status: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<i64>,
    pub fields: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ContentItem> for ContentItemResponse {
    fn from(item: ContentItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind.to_string(),
            status: item.status.to_string(),
            title: item.title,
            creator_id: item.creator_id,
            leader_id: item.leader_id,
            fields: item.fields,
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

/// Moderation controls for one item
#[derive(Debug, Serialize)]
pub struct ModerationResponse {
    pub item: ContentItemResponse,
    /// Whether the edit form should be enabled
    pub editable: bool,
    /// Transition buttons to render
    pub transitions: Vec<TransitionOption>,
}

impl From<ModerationView> for ModerationResponse {
    fn from(view: ModerationView) -> Self {
        Self {
            item: view.item.into(),
            editable: view.editable,
            transitions: view.transitions,
        }
    }
}

/// The canonical workflow tables
#[derive(Debug, Serialize)]
pub struct WorkflowTableResponse {
    pub transitions: &'static [TransitionRule],
    pub edit_rights: &'static [EditRule],
}
