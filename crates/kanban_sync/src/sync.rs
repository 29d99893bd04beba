//! Drives a [`Board`] against a [`WorkApi`].

use entities::WorkItem;
use tracing::{info, warn};
use work_protocol::{WorkMutation, WorkPatch};

use crate::{Board, ClientError, DragEnd, DropDecision, IgnoreReason, WorkApi};

/// Outcome of a drop handled by [`KanbanSync::drop_item`].
#[derive(Debug)]
pub enum SyncOutcome {
    /// The drop produced no request.
    Ignored(IgnoreReason),
    /// The server accepted the status change.
    Applied(WorkItem),
    /// The status change failed. The board was still refetched.
    Failed(ClientError),
}

/// Kanban client: a board snapshot kept in step with the server.
///
/// Every mutation is followed by a full list refetch. A failed mutation is
/// not retried.
pub struct KanbanSync<A> {
    api: A,
    board: Board,
    stale: bool,
}

impl<A: WorkApi> KanbanSync<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            board: Board::default(),
            stale: true,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// True until the first successful refresh, and after any failed refetch.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Reloads the snapshot from the server.
    pub async fn refresh(&mut self) -> Result<&Board, ClientError> {
        match self.api.list().await {
            Ok(items) => {
                self.board.replace(items);
                self.stale = false;
                Ok(&self.board)
            }
            Err(e) => {
                self.stale = true;
                Err(e)
            }
        }
    }

    /// Handles the end of a drag.
    pub async fn drop_item(&mut self, drag: DragEnd) -> SyncOutcome {
        let change = match self.board.on_drag_end(drag) {
            DropDecision::Ignored(reason) => return SyncOutcome::Ignored(reason),
            DropDecision::Accepted(change) => change,
        };

        let result = self
            .api
            .update(&change.item_id, &WorkPatch::status(change.status))
            .await;

        let _refetch = self.board.settle(&change.item_id);
        self.refetch_after_mutation().await;

        match result {
            Ok(item) => {
                info!(item_id = %item.id, status = %item.status, "Moved work item");
                SyncOutcome::Applied(item)
            }
            Err(e) => {
                warn!(item_id = %change.item_id, error = %e, "Status change failed");
                SyncOutcome::Failed(e)
            }
        }
    }

    /// Creates an item from form input. Form rules are checked before any request.
    pub async fn create_item(&mut self, form: &WorkMutation) -> Result<WorkItem, ClientError> {
        let work = form.validate_create_form()?;
        let result = self.api.create(&work).await;
        if result.is_ok() {
            self.refetch_after_mutation().await;
        }
        result
    }

    /// Deletes an item and reloads the board.
    pub async fn delete_item(&mut self, item_id: &str) -> Result<(), ClientError> {
        let result = self.api.delete(item_id).await;
        self.refetch_after_mutation().await;
        result
    }

    async fn refetch_after_mutation(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Refetch failed, board is stale");
        }
    }
}
