//! Client error types.

use thiserror::Error;
use work_protocol::ValidationErrors;

/// Errors returned by [`crate::WorkApi`] implementations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid data: {0}")]
    Validation(ValidationErrors),

    #[error("Not found")]
    NotFound,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Deserialization(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
