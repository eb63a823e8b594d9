//! Position tracking

use super::Position;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Tracks all positions, keyed by instrument code
pub struct PositionTracker {
    positions: BTreeMap<String, Position>,
}

impl PositionTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            positions: BTreeMap::new(),
        }
    }

    /// Open a position unless one already exists for the instrument
    ///
    /// Returns true if a new position was created.
    pub fn open(&mut self, code: &str, entry_price: f64, now: DateTime<Utc>) -> bool {
        if self.positions.contains_key(code) {
            return false;
        }
        self.positions
            .insert(code.to_string(), Position::new(code, entry_price, now));
        true
    }

    /// Check if an instrument has a tracked position
    pub fn contains(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    /// Get a position
    pub fn get(&self, code: &str) -> Option<&Position> {
        self.positions.get(code)
    }

    /// Get a position mutably
    pub fn get_mut(&mut self, code: &str) -> Option<&mut Position> {
        self.positions.get_mut(code)
    }

    /// Stop tracking a position
    pub fn remove(&mut self, code: &str) -> Option<Position> {
        self.positions.remove(code)
    }

    /// Tracked codes in ascending order
    pub fn codes(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    /// Iterate positions in code order
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Number of tracked positions
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Stop tracking everything
    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}
