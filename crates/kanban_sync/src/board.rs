//! Drag-and-drop state machine of the kanban board.
//!
//! The board never changes an item's status locally. An accepted drop only
//! marks the item pending; the server list fetched after settlement is the
//! next snapshot.

use std::collections::HashSet;

use entities::{WorkItem, WorkStatus};
use tracing::debug;

/// A position on the board: a column and an index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropLocation {
    pub status: WorkStatus,
    pub index: usize,
}

impl DropLocation {
    pub fn new(status: WorkStatus, index: usize) -> Self {
        Self { status, index }
    }
}

/// End of a drag gesture. `destination` is `None` when the drag was cancelled
/// or released outside any column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub item_id: String,
    pub source: DropLocation,
    pub destination: Option<DropLocation>,
}

impl DragEnd {
    /// Drag released over `destination`.
    pub fn new(item_id: impl Into<String>, source: DropLocation, destination: DropLocation) -> Self {
        Self {
            item_id: item_id.into(),
            source,
            destination: Some(destination),
        }
    }

    /// Drag that ended without a destination.
    pub fn cancelled(item_id: impl Into<String>, source: DropLocation) -> Self {
        Self {
            item_id: item_id.into(),
            source,
            destination: None,
        }
    }
}

/// Why a drop produced no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoDestination,
    SamePosition,
    SameColumn,
    UnknownItem,
    /// The item is `done`, which has no outbound transition.
    Terminal,
    /// An update for the item has not settled yet.
    AlreadyPending,
}

/// Status update the caller must send to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub item_id: String,
    pub status: WorkStatus,
}

/// Result of [`Board::on_drag_end`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropDecision {
    Ignored(IgnoreReason),
    Accepted(StatusChange),
}

/// Returned by [`Board::settle`]: the caller must reload the list.
#[must_use = "the board only reflects the server after a refetch"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refetch;

/// One column of the board.
#[derive(Debug, Clone)]
pub struct Column<'a> {
    pub status: WorkStatus,
    pub title: &'static str,
    pub items: Vec<&'a WorkItem>,
}

/// Last server snapshot plus the ids of items with an update in flight.
#[derive(Debug, Clone, Default)]
pub struct Board {
    items: Vec<WorkItem>,
    pending: HashSet<String>,
}

impl Board {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self {
            items,
            pending: HashSet::new(),
        }
    }

    /// Replaces the snapshot with a fresh server list. Pending marks survive.
    pub fn replace(&mut self, items: Vec<WorkItem>) {
        self.items = items;
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn get(&self, item_id: &str) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Groups the snapshot by status, one column per status in board order.
    /// Items keep their snapshot order inside a column.
    pub fn columns(&self) -> Vec<Column<'_>> {
        WorkStatus::ALL
            .into_iter()
            .map(|status| Column {
                status,
                title: status.column_title(),
                items: self.items.iter().filter(|i| i.status == status).collect(),
            })
            .collect()
    }

    pub fn is_pending(&self, item_id: &str) -> bool {
        self.pending.contains(item_id)
    }

    /// Ids of items with an update in flight.
    pub fn pending_ids(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    /// False for unknown items, `done` items and items with a pending update.
    pub fn is_draggable(&self, item_id: &str) -> bool {
        !self.is_pending(item_id)
            && self
                .get(item_id)
                .is_some_and(|item| !item.status.is_terminal())
    }

    /// Decides what a finished drag means.
    ///
    /// An accepted drop marks the item pending until [`Board::settle`].
    pub fn on_drag_end(&mut self, drag: DragEnd) -> DropDecision {
        let decision = self.decide(&drag);
        if let DropDecision::Accepted(change) = &decision {
            self.pending.insert(change.item_id.clone());
        }
        debug!(item_id = %drag.item_id, ?decision, "Drag ended");
        decision
    }

    fn decide(&self, drag: &DragEnd) -> DropDecision {
        let Some(destination) = drag.destination else {
            return DropDecision::Ignored(IgnoreReason::NoDestination);
        };
        if destination == drag.source {
            return DropDecision::Ignored(IgnoreReason::SamePosition);
        }
        if destination.status == drag.source.status {
            return DropDecision::Ignored(IgnoreReason::SameColumn);
        }
        let Some(item) = self.get(&drag.item_id) else {
            return DropDecision::Ignored(IgnoreReason::UnknownItem);
        };
        if item.status.is_terminal() {
            return DropDecision::Ignored(IgnoreReason::Terminal);
        }
        if self.is_pending(&item.id) {
            return DropDecision::Ignored(IgnoreReason::AlreadyPending);
        }
        // Stale source column: the item already has the target status.
        if item.status == destination.status {
            return DropDecision::Ignored(IgnoreReason::SameColumn);
        }

        DropDecision::Accepted(StatusChange {
            item_id: item.id.clone(),
            status: destination.status,
        })
    }

    /// Clears the pending mark after the update settled, whatever its outcome.
    pub fn settle(&mut self, item_id: &str) -> Refetch {
        self.pending.remove(item_id);
        Refetch
    }
}
