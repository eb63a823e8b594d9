//! Windowed momentum/turnover aggregation

use super::AnalysisWindow;
use crate::tick::{Tick, TickStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate over the ticks inside one look-back window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStat {
    /// (last / first - 1) * 100
    pub momentum_pct: f64,
    /// Sum of turnover estimates inside the window
    pub turnover_sum: f64,
    /// Number of ticks inside the window
    pub sample_count: usize,
    pub first_price: f64,
    pub last_price: f64,
}

impl WindowStat {
    /// Aggregate an ordered run of ticks
    ///
    /// Returns `None` with fewer than two ticks: a single sample carries no
    /// momentum information and must not be read as a flat market.
    pub fn from_ticks<'a>(ticks: impl IntoIterator<Item = &'a Tick>) -> Option<Self> {
        let mut first: Option<f64> = None;
        let mut last = 0.0;
        let mut turnover_sum = 0.0;
        let mut sample_count = 0;

        for tick in ticks {
            first.get_or_insert(tick.price);
            last = tick.price;
            turnover_sum += tick.turnover_estimate;
            sample_count += 1;
        }

        let first_price = first?;
        if sample_count < 2 || first_price <= 0.0 {
            return None;
        }

        Some(Self {
            momentum_pct: (last / first_price - 1.0) * 100.0,
            turnover_sum,
            sample_count,
            first_price,
            last_price: last,
        })
    }
}

/// Computes window statistics from a tick store
pub struct WindowAggregator<'a> {
    store: &'a TickStore,
}

impl<'a> WindowAggregator<'a> {
    /// Create an aggregator over a tick store
    pub fn new(store: &'a TickStore) -> Self {
        Self { store }
    }

    /// Aggregate the ticks of `code` younger than `window`
    pub fn compute(&self, code: &str, window: Duration, now: DateTime<Utc>) -> Option<WindowStat> {
        WindowStat::from_ticks(self.store.ticks_since(code, window, now))
    }

    /// Aggregate one of the fixed analysis windows
    pub fn window(&self, code: &str, window: AnalysisWindow, now: DateTime<Utc>) -> Option<WindowStat> {
        self.compute(code, window.duration(), now)
    }
}
