//! Core entity definitions for worktrack.
//!
//! This crate defines the data types shared by the server and its clients:
//! work items, their status columns, and owner references.

mod user;
mod work;

pub use user::*;
pub use work::*;
