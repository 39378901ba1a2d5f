//! REST content store
//!
//! Talks to the club API:
//! - `GET    {base}/{kind}/{id}`   - fetch an item (404 = missing)
//! - `POST   {base}/{kind}`        - create an item
//! - `PATCH  {base}/{kind}/{id}`   - update status and/or fields
//! - `POST   {base}/auth/refresh`  - trade the refresh token for a new access token
//!
//! Every request carries the current access token. When the API answers
//! `401 Unauthorized`, the token pair is refreshed and the request replayed
//! once; a second 401 is returned to the caller as an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::ContentStore;
use crate::config::StoreConfig;
use crate::models::{ContentItem, ContentKind, ContentUpdate};

#[derive(Debug, Clone, Default)]
struct TokenPair {
    access: Option<String>,
    refresh: Option<String>,
}

/// Body returned by `POST /auth/refresh`
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(alias = "access_token")]
    access: String,
    /// Present when the API rotates refresh tokens
    #[serde(default, alias = "refresh_token")]
    refresh: Option<String>,
}

pub struct RestContentStore {
    client: Client,
    base_url: String,
    tokens: RwLock<TokenPair>,
}

impl std::fmt::Debug for RestContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestContentStore")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestContentStore {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("trailpost/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: RwLock::new(TokenPair {
                access: access_token,
                refresh: refresh_token,
            }),
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
            config.access_token.clone(),
            config.refresh_token.clone(),
        )
    }

    fn item_url(&self, kind: ContentKind, id: i64) -> String {
        format!("{}/{}/{}", self.base_url, kind.path_segment(), id)
    }

    fn collection_url(&self, kind: ContentKind) -> String {
        format!("{}/{}", self.base_url, kind.path_segment())
    }

    async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.access.clone()
    }

    fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, refreshing the access token and replaying once on 401
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let token = self.access_token().await;
        let response = Self::authorize(build(&self.client), token.as_deref())
            .send()
            .await
            .context("Content API request failed")?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Content API rejected access token, refreshing");
        self.refresh(token.as_deref()).await?;

        let token = self.access_token().await;
        Self::authorize(build(&self.client), token.as_deref())
            .send()
            .await
            .context("Content API request failed after token refresh")
    }

    /// Refresh the token pair, unless another request already replaced `stale`
    async fn refresh(&self, stale: Option<&str>) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        if tokens.access.as_deref() != stale {
            return Ok(());
        }

        let refresh_token = tokens
            .refresh
            .clone()
            .context("Access token rejected and no refresh token is configured")?;

        let response = self
            .client
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .context("Token refresh request failed")?;

        if !response.status().is_success() {
            warn!("Content API token refresh failed: {}", response.status());
            anyhow::bail!("Token refresh rejected: {}", response.status());
        }

        let body: RefreshResponse = response
            .json()
            .await
            .context("Failed to decode token refresh response")?;

        tokens.access = Some(body.access);
        if let Some(refresh) = body.refresh {
            tokens.refresh = Some(refresh);
        }
        info!("Content API access token refreshed");
        Ok(())
    }

    async fn decode_item(response: Response, what: &str) -> Result<Option<ContentItem>> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Content API returned {} for {}", status, what);
        }
        let item = response
            .json::<ContentItem>()
            .await
            .with_context(|| format!("Failed to decode content item from {}", what))?;
        Ok(Some(item))
    }
}

#[async_trait]
impl ContentStore for RestContentStore {
    async fn get(&self, kind: ContentKind, id: i64) -> Result<Option<ContentItem>> {
        let url = self.item_url(kind, id);
        let response = self.send(|client| client.get(url.as_str())).await?;
        Self::decode_item(response, &format!("GET {}", url)).await
    }

    async fn create(&self, item: &ContentItem) -> Result<ContentItem> {
        let url = self.collection_url(item.kind);
        let response = self.send(|client| client.post(url.as_str()).json(item)).await?;
        Self::decode_item(response, &format!("POST {}", url))
            .await?
            .with_context(|| format!("Content API has no collection at {}", url))
    }

    async fn update(
        &self,
        kind: ContentKind,
        id: i64,
        update: &ContentUpdate,
    ) -> Result<Option<ContentItem>> {
        let url = self.item_url(kind, id);
        let response = self
            .send(|client| client.patch(url.as_str()).json(update))
            .await?;
        Self::decode_item(response, &format!("PATCH {}", url)).await
    }
}
