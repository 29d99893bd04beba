//! Server error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use work_protocol::{ErrorBody, UNAUTHORIZED_MESSAGE, ValidationErrors};

/// Message of every 500 body.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Body failed the route's validation rule-set.
    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationErrors),

    /// Body is not JSON, or not a JSON object of the expected shape.
    #[error("Malformed body: {0}")]
    MalformedBody(String),

    /// No identity could be resolved.
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error. `detail` reaches the body only when `expose` is set.
    #[error("Internal error: {detail}")]
    Internal { detail: String, expose: bool },
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServerError::Validation(errors) => (StatusCode::BAD_REQUEST, ErrorBody::invalid(&errors)),
            ServerError::MalformedBody(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::invalid(&ValidationErrors::single("body", msg)),
            ),
            ServerError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, ErrorBody::message(UNAUTHORIZED_MESSAGE))
            }
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::message(msg)),
            ServerError::Internal { detail, expose } => {
                let body = ErrorBody::message(INTERNAL_ERROR_MESSAGE);
                let body = if expose { body.with_detail(detail) } else { body };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
