//! Services layer - Business logic
//!
//! Services are responsible for:
//! - Coordinating the moderation workflow with the content store
//! - Firing collaborator hooks
//! - Handling validation and error cases

pub mod moderation;

pub use moderation::{ModerationService, ModerationServiceError, ModerationView};
