//! Wall clock anchored to the tokio timer

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Wall-clock timestamps derived from tokio's monotonic clock
///
/// Tick timestamps, confirmation deadlines and cooldowns all come from here,
/// so they advance with paused tokio time in tests and never go backwards.
#[derive(Debug, Clone, Copy)]
pub struct RadarClock {
    origin: Instant,
    origin_utc: DateTime<Utc>,
}

impl RadarClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// A clock reading `origin_utc` right now
    pub fn starting_at(origin_utc: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            origin_utc,
        }
    }

    /// Current timestamp
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin_utc + elapsed
    }
}

impl Default for RadarClock {
    fn default() -> Self {
        Self::new()
    }
}
