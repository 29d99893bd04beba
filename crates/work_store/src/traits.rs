//! Work store trait definitions.

use async_trait::async_trait;
use entities::{UserId, WorkItem};
use work_protocol::WorkPatch;

use crate::WorkStoreResult;

/// Persistence of work items.
///
/// Only `list_by_owner` filters by owner. The by-id operations act on any
/// item; callers that need an ownership guard check `get_by_id` first.
#[async_trait]
pub trait WorkStore: Send + Sync {
    /// Lists every item owned by `owner`, oldest first.
    async fn list_by_owner(&self, owner: &UserId) -> WorkStoreResult<Vec<WorkItem>>;

    /// Inserts a fully formed item and returns it as stored.
    async fn create(&self, item: WorkItem) -> WorkStoreResult<WorkItem>;

    /// Gets an item by ID.
    async fn get_by_id(&self, id: &str) -> WorkStoreResult<Option<WorkItem>>;

    /// Applies the present fields of `patch`. Returns `None` if no item has `id`.
    async fn update_by_id(&self, id: &str, patch: &WorkPatch)
        -> WorkStoreResult<Option<WorkItem>>;

    /// Deletes an item. Returns true if a row was removed.
    async fn delete_by_id(&self, id: &str) -> WorkStoreResult<bool>;
}

/// Applies the present fields of `patch` to `item`. `id`, `owner_id` and
/// `created_at` are never touched.
pub fn apply_patch(item: &mut WorkItem, patch: &WorkPatch) {
    if let Some(title) = &patch.title {
        item.title = title.clone();
    }
    if let Some(description) = &patch.description {
        item.description = Some(description.clone());
    }
    if let Some(status) = patch.status {
        item.status = status;
    }
    if let Some(end_date) = patch.end_date {
        item.end_date = Some(end_date);
    }
}
