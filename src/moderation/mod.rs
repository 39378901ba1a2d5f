//! Content moderation workflow
//!
//! One lifecycle shared by hikes, passes, articles and news:
//!
//! ```text
//! draft ──submit──▶ review ──publish──▶ published
//!   ▲                 │                    │
//!   └────reject───────┘◀───unpublish───────┘
//!   ▲
//!   └──restore── archived ◀──archive── (draft | review | published)
//! ```
//!
//! The rules live in two static tables ([`TRANSITIONS`] and [`EDIT_RIGHTS`]).
//! Everything in this module is a pure function of `(status, role)`: it
//! decides legality and never writes. Persisting the new status is the
//! caller's job (see `services::moderation`).
//!
//! # Usage
//!
//! ```rust
//! use trailpost::models::{ContentItem, ContentKind, ContentStatus, Role};
//! use trailpost::moderation::{allowed_transitions, apply_transition, is_editable};
//!
//! let item = ContentItem::new(ContentKind::Hike, "Sunrise ridge".into(), None)
//!     .with_status(ContentStatus::Review);
//!
//! assert!(is_editable(ContentStatus::Review, Role::Admin));
//! assert!(allowed_transitions(ContentStatus::Review, Role::Moderator).is_empty());
//!
//! let published = apply_transition(&item, ContentStatus::Published, Role::Admin).unwrap();
//! assert_eq!(published.status, ContentStatus::Published);
//! ```

mod error;

pub use error::ModerationError;

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{ContentItem, ContentStatus, Role, RoleSet};

/// Name of a transition, as shown on back-office buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionAction {
    /// draft → review
    Submit,
    /// review → published
    Publish,
    /// review → draft
    Reject,
    /// published → draft
    Unpublish,
    /// any non-archived → archived
    Archive,
    /// archived → draft
    Restore,
}

impl TransitionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionAction::Submit => "submit",
            TransitionAction::Publish => "publish",
            TransitionAction::Reject => "reject",
            TransitionAction::Unpublish => "unpublish",
            TransitionAction::Archive => "archive",
            TransitionAction::Restore => "restore",
        }
    }
}

/// One row of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRule {
    pub from: ContentStatus,
    pub to: ContentStatus,
    pub action: TransitionAction,
    /// Roles allowed to take this transition
    pub roles: &'static [Role],
}

impl TransitionRule {
    fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Who may submit form edits while an item is in a given status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditRule {
    pub status: ContentStatus,
    pub roles: &'static [Role],
}

const ADMIN: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Moderator];

/// The canonical transition table. Any `(from, to, role)` not listed is illegal.
pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: ContentStatus::Draft,
        to: ContentStatus::Review,
        action: TransitionAction::Submit,
        roles: STAFF,
    },
    TransitionRule {
        from: ContentStatus::Draft,
        to: ContentStatus::Archived,
        action: TransitionAction::Archive,
        roles: ADMIN,
    },
    TransitionRule {
        from: ContentStatus::Review,
        to: ContentStatus::Published,
        action: TransitionAction::Publish,
        roles: ADMIN,
    },
    TransitionRule {
        from: ContentStatus::Review,
        to: ContentStatus::Draft,
        action: TransitionAction::Reject,
        roles: ADMIN,
    },
    TransitionRule {
        from: ContentStatus::Review,
        to: ContentStatus::Archived,
        action: TransitionAction::Archive,
        roles: ADMIN,
    },
    TransitionRule {
        from: ContentStatus::Published,
        to: ContentStatus::Draft,
        action: TransitionAction::Unpublish,
        roles: ADMIN,
    },
    TransitionRule {
        from: ContentStatus::Published,
        to: ContentStatus::Archived,
        action: TransitionAction::Archive,
        roles: ADMIN,
    },
    TransitionRule {
        from: ContentStatus::Archived,
        to: ContentStatus::Draft,
        action: TransitionAction::Restore,
        roles: ADMIN,
    },
];

/// Form edit rights per status. Published and archived items are never
/// editable; only transitions apply to them.
pub const EDIT_RIGHTS: &[EditRule] = &[
    EditRule {
        status: ContentStatus::Draft,
        roles: STAFF,
    },
    EditRule {
        status: ContentStatus::Review,
        roles: ADMIN,
    },
];

/// A transition offered to an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionOption {
    pub action: TransitionAction,
    pub target: ContentStatus,
}

/// Check if an item in `status` may be edited by `role`
pub fn is_editable(status: ContentStatus, role: Role) -> bool {
    EDIT_RIGHTS
        .iter()
        .any(|rule| rule.status == status && rule.roles.contains(&role))
}

/// Statuses `role` may move an item to from `status`
pub fn allowed_transitions(status: ContentStatus, role: Role) -> BTreeSet<ContentStatus> {
    TRANSITIONS
        .iter()
        .filter(|rule| rule.from == status && rule.permits(role))
        .map(|rule| rule.to)
        .collect()
}

/// Look up the table row for `from → to`, whoever the actor is
pub fn find_rule(from: ContentStatus, to: ContentStatus) -> Option<&'static TransitionRule> {
    TRANSITIONS
        .iter()
        .find(|rule| rule.from == from && rule.to == to)
}

/// Move `item` to `target` on behalf of `role`.
///
/// Returns a copy of the item with the new status. The input is left as is,
/// and nothing is persisted.
pub fn apply_transition(
    item: &ContentItem,
    target: ContentStatus,
    role: Role,
) -> Result<ContentItem, ModerationError> {
    if !allowed_transitions(item.status, role).contains(&target) {
        return Err(ModerationError::IllegalTransition {
            from: item.status,
            to: target,
            role,
        });
    }

    let mut next = item.clone();
    next.status = target;
    Ok(next)
}

// ============================================================================
// Role-set variants
// ============================================================================

/// Check if any role in `roles` may edit an item in `status`
pub fn is_editable_by(status: ContentStatus, roles: &RoleSet) -> bool {
    roles.iter().any(|role| is_editable(status, role))
}

/// Union of the transitions offered to each held role
pub fn allowed_transitions_for(status: ContentStatus, roles: &RoleSet) -> BTreeSet<ContentStatus> {
    roles
        .iter()
        .flat_map(|role| allowed_transitions(status, role))
        .collect()
}

/// Buttons to render for an item in `status`, in table order
pub fn transition_options(status: ContentStatus, roles: &RoleSet) -> Vec<TransitionOption> {
    TRANSITIONS
        .iter()
        .filter(|rule| rule.from == status && roles.iter().any(|role| rule.permits(role)))
        .map(|rule| TransitionOption {
            action: rule.action,
            target: rule.to,
        })
        .collect()
}

/// [`apply_transition`] for an actor holding several roles.
///
/// Succeeds if any held role permits the move. A rejection reports the most
/// privileged role held.
pub fn apply_transition_as(
    item: &ContentItem,
    target: ContentStatus,
    roles: &RoleSet,
) -> Result<ContentItem, ModerationError> {
    match roles
        .iter()
        .find(|role| allowed_transitions(item.status, *role).contains(&target))
    {
        Some(role) => apply_transition(item, target, role),
        None => Err(ModerationError::IllegalTransition {
            from: item.status,
            to: target,
            role: roles.primary(),
        }),
    }
}
