//! Work item storage for worktrack
//!
//! This crate provides the owner-scoped storage abstraction behind the HTTP
//! API. It ships an in-memory store (tests, single-process mode) and a
//! SQLite store.

mod error;
mod memory;
mod sqlite;
mod traits;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use traits::*;
