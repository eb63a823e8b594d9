//! Radar core
//!
//! Ties the tick store, scorer, gate, selector, lifecycle machine and exit
//! engine into one per-cycle pipeline:
//!
//! ingest quotes -> score every instrument -> top-K -> gate -> schedule
//! confirmations -> exit checks on tracked positions

mod engine;
mod snapshot;

pub use engine::{CycleReport, Radar, ALERT_LOG_CAPACITY};
pub use snapshot::{CandidateView, FeedStatus, PositionView, RadarSnapshot};
