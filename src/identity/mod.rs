//! Identity provider
//!
//! Resolves the bearer token of an incoming request to the acting user and
//! the roles they hold. Authentication itself (login, sessions, password
//! storage) belongs to the club's auth service; this crate only asks who a
//! token belongs to.
//!
//! Providers:
//! - Static - token table from `config.yml`, for development
//! - REST - `GET {base_url}/auth/me`, cached with moka

pub mod rest;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{IdentityConfig, IdentityDriver, StaticUser};
use crate::models::Identity;

pub use rest::RestIdentityProvider;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a token. `Ok(None)` means the token is unknown or expired.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>>;
}

/// Token table loaded from configuration
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new(users: &[StaticUser]) -> Self {
        let users = users
            .iter()
            .map(|u| {
                (
                    u.token.clone(),
                    Identity {
                        user_id: u.user_id,
                        username: u.username.clone(),
                        roles: u.roles.clone(),
                    },
                )
            })
            .collect();
        Self { users }
    }

    /// Add a token (used by tests and local seeding)
    pub fn with_user(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.users.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        Ok(self.users.get(token).cloned())
    }
}

/// Create an identity provider based on configuration
pub fn create_identity_provider(config: &IdentityConfig) -> Result<Arc<dyn IdentityProvider>> {
    match config.driver {
        IdentityDriver::Static => {
            if config.users.is_empty() {
                tracing::warn!("Static identity provider has no users; every request will be anonymous");
            }
            Ok(Arc::new(StaticIdentityProvider::new(&config.users)))
        }
        IdentityDriver::Rest => {
            tracing::info!("Using REST identity provider at {}", config.base_url);
            Ok(Arc::new(RestIdentityProvider::from_config(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, RoleSet};

    #[tokio::test]
    async fn test_static_provider_resolves_known_token() {
        let provider = StaticIdentityProvider::new(&[StaticUser {
            token: "t-1".to_string(),
            user_id: 9,
            username: "ines".to_string(),
            roles: RoleSet::from(Role::Moderator),
        }]);

        let identity = provider.resolve("t-1").await.unwrap().unwrap();
        assert_eq!(identity.user_id, 9);
        assert_eq!(identity.username, "ines");
        assert!(identity.roles.contains(Role::Moderator));

        assert!(provider.resolve("t-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_identity_provider_static() {
        let mut config = IdentityConfig::default();
        config.users.push(StaticUser {
            token: "admin".to_string(),
            user_id: 1,
            username: "root".to_string(),
            roles: RoleSet::from(Role::Admin),
        });

        let provider = create_identity_provider(&config).unwrap();
        let identity = provider.resolve("admin").await.unwrap().unwrap();
        assert!(identity.roles.contains(Role::Admin));
    }
}
