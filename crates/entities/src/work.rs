//! WorkItem entity definitions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::UserId;

/// Status of a WorkItem. Each variant is one kanban column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum WorkStatus {
    /// Not scheduled yet.
    Backlog,
    /// Scheduled.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished. Terminal on the board.
    Done,
    /// Abandoned.
    Cancelled,
}

impl WorkStatus {
    /// All statuses in board column order.
    pub const ALL: [WorkStatus; 5] = [
        WorkStatus::Backlog,
        WorkStatus::Todo,
        WorkStatus::InProgress,
        WorkStatus::Done,
        WorkStatus::Cancelled,
    ];

    /// Returns the wire literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Backlog => "backlog",
            WorkStatus::Todo => "todo",
            WorkStatus::InProgress => "in-progress",
            WorkStatus::Done => "done",
            WorkStatus::Cancelled => "cancelled",
        }
    }

    /// Returns the heading of the board column for this status.
    pub fn column_title(&self) -> &'static str {
        match self {
            WorkStatus::Backlog => "Backlogs",
            WorkStatus::Todo => "Todo",
            WorkStatus::InProgress => "In Progress",
            WorkStatus::Done => "Done",
            WorkStatus::Cancelled => "Cancel",
        }
    }

    /// Returns true if an item in this status can no longer be moved on the board.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkStatus::Done)
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the five status literals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status '{0}', expected one of backlog, todo, in-progress, done, cancelled")]
pub struct UnknownStatus(pub String);

impl FromStr for WorkStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A trackable task owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Unique identifier, assigned at creation.
    pub id: String,
    /// Owner, assigned at creation from the authenticated caller.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub owner_id: UserId,
    /// Title.
    pub title: String,
    /// Description. Rows written without one read back as `None`.
    pub description: Option<String>,
    /// Current status.
    pub status: WorkStatus,
    /// Optional deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// When this record was created. Never mutated.
    pub created_at: DateTime<Utc>,
}

impl WorkItem {
    /// Creates a new work item with a fresh id.
    pub fn new(
        owner_id: UserId,
        title: impl Into<String>,
        status: WorkStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title: title.into(),
            description: None,
            status,
            end_date: None,
            created_at,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the deadline.
    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Returns true if the item is owned by `user`.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }
}
