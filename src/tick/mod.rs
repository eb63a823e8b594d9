//! Tick store module
//!
//! Per-instrument bounded time series of recent price observations.
//! Every analysis window reads from here, so retention must cover the
//! longest window plus some slack.

mod store;
mod types;

pub use store::TickStore;
pub use types::{Tick, TickOrigin};

/// How long ticks are retained per instrument (seconds)
pub const RETENTION_SECS: i64 = 210;
