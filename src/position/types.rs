//! Position types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tracked position opened by a confirmed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument code
    pub code: String,
    /// Price at confirmation
    pub entry_price: f64,
    /// Highest price seen since entry (starts at the entry price)
    pub peak_price: f64,
    /// Latest price seen by the exit engine
    pub last_price: f64,
    /// Confirmation timestamp
    pub entry_time: DateTime<Utc>,
    /// First profit target reached
    pub hit_first_target: bool,
    /// Second profit target reached
    pub hit_second_target: bool,
    /// Last time an exit alert fired
    pub last_exit_alert: Option<DateTime<Utc>>,
}

impl Position {
    /// Open a position at the given price
    pub fn new(code: impl Into<String>, entry_price: f64, entry_time: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            entry_price,
            peak_price: entry_price,
            last_price: entry_price,
            entry_time,
            hit_first_target: false,
            hit_second_target: false,
            last_exit_alert: None,
        }
    }

    /// Return in percent at a given price
    pub fn return_at(&self, price: f64) -> f64 {
        (price / self.entry_price - 1.0) * 100.0
    }

    /// Live return in percent
    pub fn return_pct(&self) -> f64 {
        self.return_at(self.last_price)
    }

    /// Return at the peak in percent
    pub fn peak_return_pct(&self) -> f64 {
        self.return_at(self.peak_price)
    }
}

/// Which profit target was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetLevel {
    First,
    Second,
}

/// Condition that advises an exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExitTrigger {
    /// 15s momentum turned negative
    MomentumFading { mom15: f64 },
    /// 60s momentum stalled while still in profit
    MediumTermWeakening { mom60: f64 },
    /// Turnover fell back to baseline
    FlowCollapse { flow_ratio: f64 },
    /// Gave back too much from the peak after a meaningful profit
    TrailingStop { peak_return_pct: f64, drawdown_pct: f64 },
}

impl fmt::Display for ExitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitTrigger::MomentumFading { mom15 } => {
                write!(f, "momentum fading (15s {:+.2}%)", mom15)
            }
            ExitTrigger::MediumTermWeakening { mom60 } => {
                write!(f, "60s weakening ({:+.2}%)", mom60)
            }
            ExitTrigger::FlowCollapse { flow_ratio } => {
                write!(f, "flow collapse (x{:.2})", flow_ratio)
            }
            ExitTrigger::TrailingStop { drawdown_pct, .. } => {
                write!(f, "trailing stop (DD {:.2}%)", drawdown_pct)
            }
        }
    }
}

/// Event raised by the exit engine for one position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionEvent {
    /// A profit target was crossed for the first time
    TargetReached {
        level: TargetLevel,
        target_pct: f64,
        return_pct: f64,
        price: f64,
    },
    /// One or more exit triggers fired (debounced)
    ExitAdvised {
        triggers: Vec<ExitTrigger>,
        return_pct: f64,
        price: f64,
    },
}

/// Exit engine thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitConfig {
    /// First profit target in percent
    pub first_target_pct: f64,
    /// Second profit target in percent
    pub second_target_pct: f64,
    /// Exit when 15s momentum drops below this
    pub fade_mom15: f64,
    /// Exit when 60s momentum drops below this...
    pub weak_mom60: f64,
    /// ...while the return is above this
    pub weak_min_return_pct: f64,
    /// Exit when the flow ratio drops below this
    pub flow_collapse_ratio: f64,
    /// Trailing stop arms once the peak return reaches this
    pub trail_activation_pct: f64,
    /// Trailing stop fires on this drawdown from the peak return
    pub trail_drawdown_pct: f64,
    /// Minimum seconds between exit alerts for one position
    pub exit_debounce_secs: u64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            first_target_pct: 2.0,
            second_target_pct: 3.0,
            fade_mom15: -0.05,
            weak_mom60: 0.10,
            weak_min_return_pct: 0.8,
            flow_collapse_ratio: 1.05,
            trail_activation_pct: 2.2,
            trail_drawdown_pct: 0.9,
            exit_debounce_secs: 60,
        }
    }
}

impl ExitConfig {
    /// Exit alert debounce window
    pub fn exit_debounce(&self) -> Duration {
        Duration::seconds(self.exit_debounce_secs as i64)
    }
}
