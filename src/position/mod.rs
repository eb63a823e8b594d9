//! Position tracking module
//!
//! Tracks instruments after ENTRY: entry price, running peak and live
//! return. The exit engine raises one-time target events and debounced
//! exit advice. Exit advice never closes a position; only an explicit
//! clear or reset does.

mod exit;
mod tracker;
mod types;

pub use exit::ExitEngine;
pub use tracker::PositionTracker;
pub use types::{ExitConfig, ExitTrigger, Position, PositionEvent, TargetLevel};
