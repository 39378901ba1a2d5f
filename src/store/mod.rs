//! Content store
//!
//! The club's content (hikes, passes, articles, news) lives behind a separate
//! REST API. This module abstracts it:
//! - In-memory store - default, for local runs and tests
//! - REST store - the club API, with access-token refresh
//!
//! The store driver is selected based on configuration. The store only
//! persists; whether a status change is legal is decided by `moderation`
//! before anything reaches it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use trailpost::config::StoreConfig;
//! use trailpost::models::{ContentKind, ContentStatus, ContentUpdate};
//! use trailpost::store::create_store;
//!
//! let store = create_store(&StoreConfig::default())?;
//! let item = store.get(ContentKind::Hike, 42).await?;
//! store.update(ContentKind::Hike, 42, &ContentUpdate::status(ContentStatus::Review)).await?;
//! ```

pub mod memory;
pub mod rest;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StoreConfig, StoreDriver};
use crate::models::{ContentItem, ContentKind, ContentUpdate};

pub use memory::MemoryContentStore;
pub use rest::RestContentStore;

/// Read/write access to the external content store
///
/// There is no optimistic concurrency control: two writers racing on the
/// same item are resolved by the store, last writer wins.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch an item by kind and id
    async fn get(&self, kind: ContentKind, id: i64) -> Result<Option<ContentItem>>;

    /// Create an item. The store assigns the id and timestamps.
    async fn create(&self, item: &ContentItem) -> Result<ContentItem>;

    /// Apply an update. Returns `None` if the item does not exist.
    async fn update(
        &self,
        kind: ContentKind,
        id: i64,
        update: &ContentUpdate,
    ) -> Result<Option<ContentItem>>;
}

/// Create a content store based on configuration
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ContentStore>> {
    match config.driver {
        StoreDriver::Memory => {
            tracing::info!("Using in-memory content store");
            Ok(Arc::new(MemoryContentStore::new()))
        }
        StoreDriver::Rest => {
            tracing::info!("Using REST content store at {}", config.base_url);
            Ok(Arc::new(RestContentStore::from_config(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentStatus;

    #[tokio::test]
    async fn test_create_store_memory() {
        let store = create_store(&StoreConfig::default()).unwrap();

        let created = store
            .create(&ContentItem::new(ContentKind::News, "Spring meeting".to_string(), Some(1)))
            .await
            .unwrap();
        let fetched = store.get(ContentKind::News, created.id).await.unwrap().unwrap();

        assert_eq!(fetched.title, "Spring meeting");
        assert_eq!(fetched.status, ContentStatus::Draft);
    }

    #[test]
    fn test_create_store_rest() {
        let config = StoreConfig {
            driver: StoreDriver::Rest,
            base_url: "http://127.0.0.1:9/api".to_string(),
            ..Default::default()
        };
        assert!(create_store(&config).is_ok());
    }
}
