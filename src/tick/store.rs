//! Bounded per-instrument tick storage

use super::{Tick, TickOrigin, RETENTION_SECS};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

/// Per-instrument rolling tick history
///
/// Ticks are kept in timestamp order and pruned once they fall out of the
/// retention window. The poll driver is the only writer.
///
/// Each series remembers the origin of its ticks. Fallback ticks never land
/// on top of primary history, and the first primary tick after a fallback
/// run restarts the series.
pub struct TickStore {
    series: HashMap<String, VecDeque<Tick>>,
    origins: HashMap<String, TickOrigin>,
    retention: Duration,
}

impl TickStore {
    /// Create a store with the default retention window
    pub fn new() -> Self {
        Self::with_retention(Duration::seconds(RETENTION_SECS))
    }

    /// Create a store with a custom retention window
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            series: HashMap::new(),
            origins: HashMap::new(),
            retention,
        }
    }

    /// Append a primary observation for an instrument
    ///
    /// See [`TickStore::record_from`].
    pub fn record(
        &mut self,
        code: &str,
        price: f64,
        daily_change_pct: f64,
        now: DateTime<Utc>,
    ) -> Option<Tick> {
        self.record_from(code, price, daily_change_pct, TickOrigin::Primary, now)
    }

    /// Append an observation from a given origin
    ///
    /// The turnover estimate is computed against the previously recorded
    /// price. Returns `None` (and records nothing) when the price is not a
    /// positive finite number, the timestamp is not after the latest tick,
    /// or a fallback tick would land on live primary history.
    pub fn record_from(
        &mut self,
        code: &str,
        price: f64,
        daily_change_pct: f64,
        origin: TickOrigin,
        now: DateTime<Utc>,
    ) -> Option<Tick> {
        if !price.is_finite() || price <= 0.0 {
            tracing::trace!(code, price, "Ignoring invalid price");
            return None;
        }

        let daily_change_pct = if daily_change_pct.is_finite() {
            daily_change_pct
        } else {
            0.0
        };

        let series = self.series.entry(code.to_string()).or_default();
        let current = self.origins.entry(code.to_string()).or_insert(origin);

        if *current != origin && !series.is_empty() {
            match origin {
                TickOrigin::Fallback => {
                    tracing::trace!(code, "Keeping primary history, fallback tick ignored");
                    return None;
                }
                TickOrigin::Primary => {
                    tracing::debug!(code, dropped = series.len(), "Primary data back, restarting history");
                    series.clear();
                }
            }
        }
        *current = origin;

        if let Some(last) = series.back() {
            if now <= last.timestamp {
                tracing::debug!(code, "Dropping out-of-order tick");
                return None;
            }
        }

        let tick = Tick::new(now, price, series.back().map(|t| t.price), daily_change_pct);
        series.push_back(tick);

        let cutoff = now - self.retention;
        Self::prune_series(series, cutoff);

        Some(tick)
    }

    /// Drop every tick older than `cutoff` across all instruments
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) {
        for series in self.series.values_mut() {
            Self::prune_series(series, cutoff);
        }
    }

    fn prune_series(series: &mut VecDeque<Tick>, cutoff: DateTime<Utc>) {
        while let Some(front) = series.front() {
            if front.timestamp < cutoff {
                series.pop_front();
            } else {
                break;
            }
        }
    }

    /// Ticks recorded within `window` of `now`, oldest first
    pub fn ticks_since(
        &self,
        code: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &Tick> + '_ {
        let cutoff = now - window;
        self.series.get(code).into_iter().flat_map(move |series| {
            let start = series.partition_point(|t| t.timestamp < cutoff);
            series.range(start..)
        })
    }

    /// Most recent tick for an instrument
    pub fn latest(&self, code: &str) -> Option<&Tick> {
        self.series.get(code).and_then(|s| s.back())
    }

    /// Origin of an instrument's history
    pub fn origin(&self, code: &str) -> Option<TickOrigin> {
        self.origins.get(code).copied()
    }

    /// Number of ticks currently held for an instrument
    pub fn len(&self, code: &str) -> usize {
        self.series.get(code).map_or(0, |s| s.len())
    }

    /// Check whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.series.values().all(|s| s.is_empty())
    }

    /// Codes of every instrument that has been observed, sorted
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.series.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Number of instruments with at least one observation ever
    pub fn instrument_count(&self) -> usize {
        self.series.len()
    }

    /// Retention window
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.series.clear();
        self.origins.clear();
    }
}

impl Default for TickStore {
    fn default() -> Self {
        Self::new()
    }
}
