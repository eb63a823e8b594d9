//! Alerts raised by the radar and the sinks that deliver them
//!
//! The core produces [`Alert`] values; delivery is fire-and-forget through a
//! [`NotificationSink`].

mod sink;
mod types;

pub use sink::{BroadcastSink, LogSink, MultiSink, NotificationSink};
pub use types::{Alert, AlertKind, MAX_TRIGGERS_IN_BODY};
