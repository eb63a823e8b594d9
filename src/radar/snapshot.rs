//! Read-only views handed to the host

use crate::alert::Alert;
use crate::lifecycle::LifecycleState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of the data feed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeedStatus {
    /// Nothing fetched yet
    #[default]
    Idle,
    /// Last fetch answered by the primary source
    Live,
    /// Data came from the fallback, or a stale universe is being reused
    Degraded { reason: String },
    /// Last quote fetch failed outright
    Unavailable {
        reason: String,
        consecutive_failures: u32,
    },
}

impl FeedStatus {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FeedStatus::Unavailable { .. })
    }
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedStatus::Idle => write!(f, "idle"),
            FeedStatus::Live => write!(f, "live"),
            FeedStatus::Degraded { reason } => write!(f, "degraded ({})", reason),
            FeedStatus::Unavailable {
                reason,
                consecutive_failures,
            } => write!(f, "unavailable x{} ({})", consecutive_failures, reason),
        }
    }
}

/// One top-K row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateView {
    /// 1-based rank
    pub rank: usize,
    pub code: String,
    pub name: String,
    pub price: f64,
    pub daily_change_pct: f64,
    pub mom15: f64,
    pub mom60: f64,
    pub flow_ratio: f64,
    pub turnover60: f64,
    pub score: f64,
    pub heat: f64,
    pub gate_passed: bool,
    /// Why the gate rejected, if it did
    pub gate_reject: Option<String>,
    pub state: LifecycleState,
}

/// One tracked position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub code: String,
    pub name: String,
    pub entry_price: f64,
    pub last_price: f64,
    pub peak_price: f64,
    pub return_pct: f64,
    pub peak_return_pct: f64,
    pub hit_first_target: bool,
    pub hit_second_target: bool,
    /// Latest-cycle signal values, absent while unscoreable
    pub mom15: Option<f64>,
    pub mom60: Option<f64>,
    pub flow_ratio: Option<f64>,
    pub state: LifecycleState,
    pub entry_time: DateTime<Utc>,
}

/// Everything a host needs to render one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSnapshot {
    pub running: bool,
    pub feed: FeedStatus,
    /// Completed cycles
    pub cycle: u64,
    /// When the latest cycle ran
    pub taken_at: Option<DateTime<Utc>>,
    /// Instruments with any history
    pub tracked_instruments: usize,
    /// Instruments scoreable in the latest cycle
    pub scoreable_instruments: usize,
    pub candidates: Vec<CandidateView>,
    pub positions: Vec<PositionView>,
    /// Most recent alerts, newest first
    pub recent_alerts: Vec<Alert>,
}

impl RadarSnapshot {
    /// Candidates that currently pass the entry gate
    pub fn passing_candidates(&self) -> usize {
        self.candidates.iter().filter(|c| c.gate_passed).count()
    }

    /// One-line status
    ///
    /// A failing feed, a radar still collecting history and a radar whose
    /// candidates all fail the gate each get their own message.
    pub fn headline(&self) -> String {
        let line = match &self.feed {
            FeedStatus::Unavailable {
                reason,
                consecutive_failures,
            } => {
                return format!(
                    "feed unavailable ({} consecutive failures): {}",
                    consecutive_failures, reason
                )
            }
            FeedStatus::Idle if !self.running => return "stopped".to_string(),
            FeedStatus::Idle => return "waiting for first fetch".to_string(),
            _ if self.scoreable_instruments == 0 => {
                "warming up (no instrument scoreable yet)".to_string()
            }
            _ => match self.passing_candidates() {
                0 => "no candidate passes the entry gate".to_string(),
                1 => "1 candidate".to_string(),
                n => format!("{} candidates", n),
            },
        };

        match &self.feed {
            FeedStatus::Degraded { reason } => format!("{} [degraded: {}]", line, reason),
            _ => line,
        }
    }
}
