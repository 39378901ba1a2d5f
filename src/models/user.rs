//! User model
//!
//! This module defines roles and the acting identity for the moderation workflow.
//! Role membership is a set lookup, not a hierarchy: holding `admin` does not
//! imply holding `moderator`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// User role for authorization.
///
/// Roles determine what actions a user can perform:
/// - Admin: every moderation transition, edits drafts and items under review
/// - Moderator: submits drafts for review, edits drafts
/// - User: creates new drafts only
///
/// Variants are declared most privileged first, so the derived ordering puts
/// `Admin` at the front of a `RoleSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator - full access
    Admin,
    /// Moderator - can advance drafts to review
    Moderator,
    /// Regular member - can create drafts
    User,
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Moderator, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Set of roles held by an actor
///
/// Serialized as a plain list (`["admin", "user"]`). An empty set is an
/// anonymous actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Check if the set contains a role
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Add a role
    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate roles, most privileged first
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Most privileged role held, used when reporting a rejected action.
    ///
    /// Falls back to `User` for an anonymous actor.
    pub fn primary(&self) -> Role {
        self.0.iter().next().copied().unwrap_or_default()
    }

    /// Check if the actor is staff (admin or moderator)
    pub fn is_staff(&self) -> bool {
        self.contains(Role::Admin) || self.contains(Role::Moderator)
    }
}

impl From<Role> for RoleSet {
    fn from(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Authenticated actor, as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID in the club directory
    pub user_id: i64,
    /// Login name
    pub username: String,
    /// Roles held
    #[serde(default)]
    pub roles: RoleSet,
}

impl Identity {
    pub fn new(user_id: i64, username: impl Into<String>, roles: impl Into<RoleSet>) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles: roles.into(),
        }
    }
}
