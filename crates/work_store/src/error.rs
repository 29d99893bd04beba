//! Work store error types.

use thiserror::Error;

/// Errors that can occur during work store operations.
#[derive(Debug, Error)]
pub enum WorkStoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be read back as a work item.
    #[error("Corrupt row {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl WorkStoreError {
    /// Creates a corrupt row error.
    pub fn corrupt(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for work store operations.
pub type WorkStoreResult<T> = Result<T, WorkStoreError>;
