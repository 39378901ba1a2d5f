//! Moderation workflow error types

use thiserror::Error;

use crate::models::{ContentStatus, Role};

/// Moderation workflow errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    /// Requested transition is not offered for this status and role
    #[error("Illegal transition from {from} to {to} for role {role}")]
    IllegalTransition {
        from: ContentStatus,
        to: ContentStatus,
        role: Role,
    },
}
