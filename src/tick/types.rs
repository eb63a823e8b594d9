//! Tick types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which kind of source produced an instrument's history
///
/// One series never mixes origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TickOrigin {
    /// The configured source
    #[default]
    Primary,
    /// Stand-in data served while the primary was failing
    Fallback,
}

/// A single polled observation for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// When the observation was recorded
    pub timestamp: DateTime<Utc>,
    /// Last traded price
    pub price: f64,
    /// Activity proxy: |price - previous price| * price
    pub turnover_estimate: f64,
    /// Change versus the previous session close, in percent
    pub daily_change_pct: f64,
}

impl Tick {
    /// Create a tick, deriving the turnover estimate from the previous price
    pub fn new(
        timestamp: DateTime<Utc>,
        price: f64,
        previous_price: Option<f64>,
        daily_change_pct: f64,
    ) -> Self {
        let turnover_estimate = previous_price
            .map(|prev| (price - prev).abs() * price)
            .unwrap_or(0.0);

        Self {
            timestamp,
            price,
            turnover_estimate,
            daily_change_pct,
        }
    }
}
