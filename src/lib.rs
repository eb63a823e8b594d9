//! quote-radar: real-time momentum radar for polled equity quotes
//!
//! This library provides the core components for:
//! - Rolling per-instrument tick history
//! - Windowed momentum, flow and turnover aggregates
//! - Candidate scoring, entry gating and top-K selection
//! - Per-instrument lifecycle with delayed confirmation and cooldown
//! - Position tracking with profit targets and exit triggers
//! - Universe and quote sources with synthetic fallback
//! - A fixed-interval poll driver with snapshots and alert sinks
//! - Structured logging and Prometheus metrics

pub mod alert;
pub mod cli;
pub mod config;
pub mod driver;
pub mod lifecycle;
pub mod position;
pub mod radar;
pub mod signal;
pub mod source;
pub mod telemetry;
pub mod tick;
pub mod window;
