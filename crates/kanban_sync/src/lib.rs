//! Kanban board client for the worktrack API.
//!
//! [`Board`] is the pure drag-and-drop state machine. [`KanbanSync`] drives
//! it against any [`WorkApi`], and [`HttpWorkClient`] is the HTTP
//! implementation of that API.

mod api;
mod board;
mod client;
mod error;
mod sync;

pub use api::*;
pub use board::*;
pub use client::*;
pub use error::*;
pub use sync::*;
