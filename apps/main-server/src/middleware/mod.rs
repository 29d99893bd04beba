//! Request middleware.

pub mod auth;

pub use self::auth::{AuthenticatedUser, auth_middleware, session_cookie};
