//! Data models
//!
//! This module contains the data structures shared by the moderation workflow,
//! the content store clients and the HTTP API:
//! - Content entities (Hike, Pass, Article, News share `ContentItem`)
//! - Roles and the acting identity
//! - Create/edit/update input types

mod content;
mod user;

pub use content::{
    ContentEditInput, ContentItem, ContentKind, ContentStatus, ContentUpdate, CreateContentInput,
};
pub use user::{Identity, Role, RoleSet};
