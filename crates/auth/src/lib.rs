//! Session resolution for worktrack.
//!
//! This crate provides:
//! - Credential transports (session cookie, bearer token)
//! - The `SessionResolver` seam used by the server's identity middleware
//! - JWT sessions, plus in-memory and SQLite session stores

mod error;
mod jwt;
mod session;
mod session_store;
mod token;

pub use error::*;
pub use jwt::*;
pub use session::*;
pub use session_store::*;
pub use token::*;

/// Default session lifetime in hours.
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 24 * 7;

/// Default JWT issuer.
pub const DEFAULT_JWT_ISSUER: &str = "worktrack";

/// Default name of the session cookie.
pub const DEFAULT_SESSION_COOKIE: &str = "worktrack.session_token";
