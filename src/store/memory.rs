//! In-memory content store
//!
//! Keeps items in a `HashMap` behind a tokio `RwLock`. Ids come from one
//! counter shared by all kinds, like a single-table backend would hand out.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::ContentStore;
use crate::models::{ContentItem, ContentKind, ContentUpdate};

pub struct MemoryContentStore {
    items: RwLock<HashMap<(ContentKind, i64), ContentItem>>,
    next_id: AtomicI64,
}

impl std::fmt::Debug for MemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContentStore")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store an item as is, keeping its id if it has one.
    ///
    /// Lets tests and local seeding put items straight into any status.
    pub async fn insert(&self, mut item: ContentItem) -> ContentItem {
        if item.id == 0 {
            item.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        } else {
            self.next_id.fetch_max(item.id + 1, Ordering::Relaxed);
        }
        self.items
            .write()
            .await
            .insert((item.kind, item.id), item.clone());
        item
    }

    /// Number of stored items
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn get(&self, kind: ContentKind, id: i64) -> Result<Option<ContentItem>> {
        Ok(self.items.read().await.get(&(kind, id)).cloned())
    }

    async fn create(&self, item: &ContentItem) -> Result<ContentItem> {
        let now = Utc::now();
        let mut created = item.clone();
        created.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        created.created_at = now;
        created.updated_at = now;

        self.items
            .write()
            .await
            .insert((created.kind, created.id), created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        kind: ContentKind,
        id: i64,
        update: &ContentUpdate,
    ) -> Result<Option<ContentItem>> {
        let mut items = self.items.write().await;
        let Some(item) = items.get_mut(&(kind, id)) else {
            return Ok(None);
        };

        if let Some(status) = update.status {
            item.status = status;
        }
        if let Some(ref title) = update.title {
            item.title = title.clone();
        }
        if let Some(ref fields) = update.fields {
            item.fields = fields.clone();
        }
        if let Some(leader_id) = update.leader_id {
            item.leader_id = Some(leader_id);
        }
        item.updated_at = Utc::now();

        Ok(Some(item.clone()))
    }
}
