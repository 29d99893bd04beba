//! Server-side services.

pub mod clock;

pub use clock::MonotonicClock;
