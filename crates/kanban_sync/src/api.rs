//! The API surface the board talks to.

use async_trait::async_trait;
use entities::WorkItem;
use work_protocol::{CreateWork, WorkPatch};

use crate::ClientError;

/// Remote work item operations, scoped to the signed-in user.
#[async_trait]
pub trait WorkApi: Send + Sync {
    /// Lists the caller's items.
    async fn list(&self) -> Result<Vec<WorkItem>, ClientError>;

    /// Creates an item.
    async fn create(&self, work: &CreateWork) -> Result<WorkItem, ClientError>;

    /// Applies a partial update.
    async fn update(&self, id: &str, patch: &WorkPatch) -> Result<WorkItem, ClientError>;

    /// Deletes an item. Deleting a missing item succeeds.
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}
