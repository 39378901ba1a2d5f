//! Content model
//!
//! This module provides:
//! - `ContentKind` for the four moderated record types (hike, pass, article, news)
//! - `ContentStatus` for the moderation lifecycle
//! - `ContentItem`, the shape shared by every moderated record
//! - Input types for creating, editing and updating content

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of moderated content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Club hike
    Hike,
    /// Mountain pass
    Pass,
    /// Long-form article
    Article,
    /// Club news
    News,
}

impl ContentKind {
    /// All kinds, in display order
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Hike,
        ContentKind::Pass,
        ContentKind::Article,
        ContentKind::News,
    ];

    /// Convert kind to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Hike => "hike",
            ContentKind::Pass => "pass",
            ContentKind::Article => "article",
            ContentKind::News => "news",
        }
    }

    /// Collection path segment used by the content API (`hikes`, `passes`, ...)
    pub fn path_segment(&self) -> &'static str {
        match self {
            ContentKind::Hike => "hikes",
            ContentKind::Pass => "passes",
            ContentKind::Article => "articles",
            ContentKind::News => "news",
        }
    }

    /// Parse a collection path segment
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.path_segment() == segment)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hike" => Ok(ContentKind::Hike),
            "pass" => Ok(ContentKind::Pass),
            "article" => Ok(ContentKind::Article),
            "news" => Ok(ContentKind::News),
            _ => Err(anyhow::anyhow!("Invalid content kind: {}", s)),
        }
    }
}

/// Moderation status of a content item
///
/// The derived ordering follows the lifecycle and gives sets of statuses a
/// stable iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    /// Draft - being written, not visible to public
    Draft,
    /// Review - submitted, waiting for an administrator
    Review,
    /// Published - visible to public
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl Default for ContentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ContentStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [ContentStatus; 4] = [
        ContentStatus::Draft,
        ContentStatus::Review,
        ContentStatus::Published,
        ContentStatus::Archived,
    ];

    /// Convert status to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Review => "review",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "review" => Ok(ContentStatus::Review),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            _ => Err(anyhow::anyhow!("Invalid content status: {}", s)),
        }
    }
}

/// A moderated record (hike, pass, article or news)
///
/// Only `status` is governed by the moderation workflow. Everything else is
/// owned by the external content store and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier, assigned by the store
    pub id: i64,
    /// Content kind
    pub kind: ContentKind,
    /// Moderation status
    pub status: ContentStatus,
    /// Display title
    pub title: String,
    /// User who created the item
    #[serde(default)]
    pub creator_id: Option<i64>,
    /// Hike leader (hikes only)
    #[serde(default)]
    pub leader_id: Option<i64>,
    /// Content fields (description, route, elevation, body, ...)
    #[serde(default = "default_fields")]
    pub fields: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

fn default_fields() -> serde_json::Value {
    serde_json::json!({})
}

impl ContentItem {
    /// Create a new, not yet stored, draft item
    pub fn new(kind: ContentKind, title: String, creator_id: Option<i64>) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the store
            kind,
            status: ContentStatus::Draft,
            title,
            creator_id,
            leader_id: None,
            fields: default_fields(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the content fields
    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = fields;
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the hike leader
    pub fn with_leader(mut self, leader_id: i64) -> Self {
        self.leader_id = Some(leader_id);
        self
    }
}

/// Write sent to the content store
///
/// A status change may be bundled with field edits; `None` leaves the
/// stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<i64>,
}

impl ContentUpdate {
    /// Update that only changes the status
    pub fn status(status: ContentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Check if the update changes nothing
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.title.is_none()
            && self.fields.is_none()
            && self.leader_id.is_none()
    }
}

/// Input for creating a content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContentInput {
    /// Display title
    pub title: String,
    /// Content fields
    #[serde(default = "default_fields")]
    pub fields: serde_json::Value,
    /// Hike leader (optional)
    #[serde(default)]
    pub leader_id: Option<i64>,
    /// Submit directly for moderation instead of saving a draft
    #[serde(default)]
    pub submit: bool,
}

impl CreateContentInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: default_fields(),
            leader_id: None,
            submit: false,
        }
    }

    /// Submit for review on creation
    pub fn submitted(mut self) -> Self {
        self.submit = true;
        self
    }
}

/// Input for editing a content item through the back-office form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentEditInput {
    /// New title (optional)
    #[serde(default)]
    pub title: Option<String>,
    /// New content fields (optional)
    #[serde(default)]
    pub fields: Option<serde_json::Value>,
    /// New hike leader (optional)
    #[serde(default)]
    pub leader_id: Option<i64>,
    /// Status change bundled with the edit (optional, must be a legal transition)
    #[serde(default)]
    pub status: Option<ContentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_item_new_is_draft() {
        let item = ContentItem::new(ContentKind::Hike, "Sunrise ridge".to_string(), Some(7));

        assert_eq!(item.id, 0);
        assert_eq!(item.status, ContentStatus::Draft);
        assert_eq!(item.creator_id, Some(7));
        assert_eq!(item.fields, serde_json::json!({}));
    }

    #[test]
    fn test_content_status_from_str() {
        assert_eq!("draft".parse::<ContentStatus>().unwrap(), ContentStatus::Draft);
        assert_eq!("REVIEW".parse::<ContentStatus>().unwrap(), ContentStatus::Review);
        assert_eq!("Published".parse::<ContentStatus>().unwrap(), ContentStatus::Published);
        assert_eq!("archived".parse::<ContentStatus>().unwrap(), ContentStatus::Archived);
        assert!("deleted".parse::<ContentStatus>().is_err());
        assert!("".parse::<ContentStatus>().is_err());
    }

    #[test]
    fn test_content_status_rejects_unknown_json() {
        let parsed: Result<ContentStatus, _> = serde_json::from_str("\"pending\"");
        assert!(parsed.is_err());

        let parsed: ContentStatus = serde_json::from_str("\"review\"").unwrap();
        assert_eq!(parsed, ContentStatus::Review);
    }

    #[test]
    fn test_content_status_display() {
        for status in ContentStatus::ALL {
            assert_eq!(status.to_string().parse::<ContentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_content_status_default() {
        assert_eq!(ContentStatus::default(), ContentStatus::Draft);
    }

    #[test]
    fn test_content_kind_path_segments() {
        assert_eq!(ContentKind::from_path_segment("hikes"), Some(ContentKind::Hike));
        assert_eq!(ContentKind::from_path_segment("passes"), Some(ContentKind::Pass));
        assert_eq!(ContentKind::from_path_segment("articles"), Some(ContentKind::Article));
        assert_eq!(ContentKind::from_path_segment("news"), Some(ContentKind::News));
        assert_eq!(ContentKind::from_path_segment("hike"), None);
        assert_eq!(ContentKind::from_path_segment("roster"), None);
    }

    #[test]
    fn test_content_item_deserialize_defaults() {
        let json = serde_json::json!({
            "id": 12,
            "kind": "pass",
            "status": "published",
            "title": "Col du Lautaret",
            "created_at": "2024-05-01T08:00:00Z",
            "updated_at": "2024-05-02T08:00:00Z"
        });

        let item: ContentItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.kind, ContentKind::Pass);
        assert_eq!(item.status, ContentStatus::Published);
        assert_eq!(item.creator_id, None);
        assert_eq!(item.fields, serde_json::json!({}));
    }

    #[test]
    fn test_content_update_serializes_only_set_fields() {
        let update = ContentUpdate::status(ContentStatus::Review);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "review" }));
        assert!(!update.is_empty());
        assert!(ContentUpdate::default().is_empty());
    }
}
