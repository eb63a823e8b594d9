//! Lifecycle types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-instrument lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LifecycleState {
    /// Never passed the gate (or released)
    #[default]
    None,
    /// Passed the gate, not scheduled
    Ready,
    /// Confirmation timer pending
    Confirm,
    /// Entry confirmed, position tracked
    Entry,
    /// Exit advised; the position is still tracked
    Exit,
}

impl LifecycleState {
    /// Upper-case label used in logs and tables
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::None => "NONE",
            LifecycleState::Ready => "READY",
            LifecycleState::Confirm => "CONFIRM",
            LifecycleState::Entry => "ENTRY",
            LifecycleState::Exit => "EXIT",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable lifecycle record for one instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    pub state: LifecycleState,
    /// When the pending confirmation is due
    pub pending_confirm_deadline: Option<DateTime<Utc>>,
    /// Last time scheduling or an entry alert fired (cooldown anchor)
    pub last_alert: Option<DateTime<Utc>>,
}

/// Lifecycle timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Delay between scheduling and the confirmation re-check (milliseconds)
    pub confirm_delay_ms: u64,
    /// Minimum time between scheduling attempts per instrument (minutes)
    pub cooldown_minutes: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            confirm_delay_ms: 3_500,
            cooldown_minutes: 7,
        }
    }
}

impl LifecycleConfig {
    /// Confirmation delay
    pub fn confirm_delay(&self) -> Duration {
        Duration::milliseconds(self.confirm_delay_ms as i64)
    }

    /// Cooldown period
    pub fn cooldown(&self) -> Duration {
        Duration::minutes(self.cooldown_minutes as i64)
    }
}
