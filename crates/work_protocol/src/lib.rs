//! Request/response contract for the worktrack work item API.
//!
//! The same types validate inbound bodies on the server and shape outbound
//! requests on clients, so both sides reject the same malformed input.

mod error;
mod mutation;

pub use error::*;
pub use mutation::*;

/// Base path under which every work item route is mounted.
pub const API_BASE_PATH: &str = "/api";

/// Message returned in the body of every 401 response.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
