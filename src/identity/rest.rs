//! REST identity provider
//!
//! Asks the club auth API who a token belongs to and caches the answer for
//! `cache_ttl_seconds`. Only successful lookups are cached, so a user who
//! just logged in is never stuck behind a cached rejection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::IdentityProvider;
use crate::config::IdentityConfig;
use crate::models::{Identity, Role, RoleSet};

/// Maximum number of cached tokens
const MAX_CACHED_TOKENS: u64 = 10_000;

/// Body of `GET /auth/me`
#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(alias = "user_id")]
    id: i64,
    username: String,
    #[serde(default)]
    roles: Vec<String>,
}

impl From<MeResponse> for Identity {
    fn from(me: MeResponse) -> Self {
        // The auth API knows roles this service has no use for
        let roles: RoleSet = me
            .roles
            .iter()
            .filter_map(|name| match name.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    debug!("Ignoring unknown role '{}' for user {}", name, me.id);
                    None
                }
            })
            .collect();

        Identity {
            user_id: me.id,
            username: me.username,
            roles,
        }
    }
}

pub struct RestIdentityProvider {
    client: Client,
    base_url: String,
    cache: Cache<String, Identity>,
}

impl std::fmt::Debug for RestIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestIdentityProvider")
            .field("base_url", &self.base_url)
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

impl RestIdentityProvider {
    pub fn new(base_url: impl Into<String>, cache_ttl: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("trailpost/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_TOKENS)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.cache_ttl_seconds),
        )
    }

    async fn fetch(&self, token: &str) -> Result<Option<Identity>> {
        let response = self
            .client
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .context("Identity lookup failed")?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let me: MeResponse = response
                    .json()
                    .await
                    .context("Failed to decode identity response")?;
                Ok(Some(me.into()))
            }
            status => anyhow::bail!("Auth API returned {} for /auth/me", status),
        }
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        if let Some(identity) = self.cache.get(token).await {
            return Ok(Some(identity));
        }

        let identity = self.fetch(token).await?;
        if let Some(ref identity) = identity {
            self.cache.insert(token.to_string(), identity.clone()).await;
        }
        Ok(identity)
    }
}
