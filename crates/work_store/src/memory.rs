//! In-memory work store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use entities::{UserId, WorkItem};
use tokio::sync::RwLock;
use work_protocol::WorkPatch;

use crate::{WorkStore, WorkStoreResult, apply_patch};

/// In-memory work store. Items are kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryWorkStore {
    items: Arc<RwLock<Vec<WorkItem>>>,
}

impl MemoryWorkStore {
    /// Creates a new in-memory work store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkStore for MemoryWorkStore {
    async fn list_by_owner(&self, owner: &UserId) -> WorkStoreResult<Vec<WorkItem>> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|item| item.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn create(&self, item: WorkItem) -> WorkStoreResult<WorkItem> {
        let mut items = self.items.write().await;
        items.push(item.clone());
        Ok(item)
    }

    async fn get_by_id(&self, id: &str) -> WorkStoreResult<Option<WorkItem>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn update_by_id(
        &self,
        id: &str,
        patch: &WorkPatch,
    ) -> WorkStoreResult<Option<WorkItem>> {
        let mut items = self.items.write().await;
        Ok(items.iter_mut().find(|item| item.id == id).map(|item| {
            apply_patch(item, patch);
            item.clone()
        }))
    }

    async fn delete_by_id(&self, id: &str) -> WorkStoreResult<bool> {
        let mut items = self.items.write().await;
        let before_count = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() != before_count)
    }
}
