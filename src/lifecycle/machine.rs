//! Per-instrument lifecycle transitions

use super::{LifecycleConfig, LifecycleRecord, LifecycleState};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Outcome of a scheduling attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// READY -> CONFIRM, confirmation due at the deadline
    Scheduled { deadline: DateTime<Utc> },
    /// A confirmation is already pending
    AlreadyPending,
    /// Cooldown still running
    CoolingDown { until: DateTime<Utc> },
    /// The instrument already has a tracked position
    HasPosition,
}

/// Lifecycle state machines for all instruments
///
/// Records are created lazily the first time an instrument passes the
/// entry gate and are only dropped by [`LifecycleMachine::reset`].
pub struct LifecycleMachine {
    config: LifecycleConfig,
    records: HashMap<String, LifecycleRecord>,
}

impl LifecycleMachine {
    /// Create a machine with the given timing configuration
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
        }
    }

    /// Replace the timing configuration, keeping all records
    pub fn set_config(&mut self, config: LifecycleConfig) {
        self.config = config;
    }

    /// Current timing configuration
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Current state of an instrument
    pub fn state(&self, code: &str) -> LifecycleState {
        self.records
            .get(code)
            .map(|r| r.state)
            .unwrap_or(LifecycleState::None)
    }

    /// Record for an instrument, if one exists
    pub fn record(&self, code: &str) -> Option<&LifecycleRecord> {
        self.records.get(code)
    }

    /// NONE -> READY on a gate pass when no position is tracked
    ///
    /// Returns true if the transition happened.
    pub fn mark_ready(&mut self, code: &str, has_position: bool) -> bool {
        if has_position {
            return false;
        }

        let record = self.records.entry(code.to_string()).or_default();
        if record.state == LifecycleState::None {
            record.state = LifecycleState::Ready;
            tracing::debug!(code, "NONE -> READY");
            return true;
        }
        false
    }

    /// READY -> CONFIRM, guarded by pending-idempotency and cooldown
    ///
    /// A successful schedule stamps the cooldown anchor.
    pub fn try_schedule(&mut self, code: &str, has_position: bool, now: DateTime<Utc>) -> ScheduleOutcome {
        if has_position {
            return ScheduleOutcome::HasPosition;
        }

        let cooldown = self.config.cooldown();
        let delay = self.config.confirm_delay();
        let record = self.records.entry(code.to_string()).or_default();

        if record.state == LifecycleState::Confirm {
            return ScheduleOutcome::AlreadyPending;
        }

        if let Some(last) = record.last_alert {
            let until = last + cooldown;
            if now < until {
                return ScheduleOutcome::CoolingDown { until };
            }
        }

        let deadline = now + delay;
        record.state = LifecycleState::Confirm;
        record.pending_confirm_deadline = Some(deadline);
        record.last_alert = Some(now);

        tracing::info!(code, %deadline, "READY -> CONFIRM");
        ScheduleOutcome::Scheduled { deadline }
    }

    /// Codes whose confirmation deadline has passed, sorted
    pub fn due(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut codes: Vec<String> = self
            .records
            .iter()
            .filter(|(_, r)| {
                r.state == LifecycleState::Confirm
                    && r.pending_confirm_deadline.is_some_and(|d| d <= now)
            })
            .map(|(code, _)| code.clone())
            .collect();
        codes.sort();
        codes
    }

    /// Check if a confirmation is pending for an instrument
    pub fn is_pending(&self, code: &str) -> bool {
        self.state(code) == LifecycleState::Confirm
    }

    /// Resolve a pending confirmation
    ///
    /// CONFIRM -> ENTRY when the gate still passes, CONFIRM -> READY
    /// otherwise. Returns the new state, or `None` if nothing was pending
    /// (for example after a reset).
    pub fn resolve_confirmation(&mut self, code: &str, gate_passed: bool, now: DateTime<Utc>) -> Option<LifecycleState> {
        let record = self.records.get_mut(code)?;
        if record.state != LifecycleState::Confirm {
            return None;
        }

        record.pending_confirm_deadline = None;
        if gate_passed {
            record.state = LifecycleState::Entry;
            record.last_alert = Some(now);
            tracing::info!(code, "CONFIRM -> ENTRY");
        } else {
            record.state = LifecycleState::Ready;
            tracing::info!(code, "CONFIRM -> READY (gate failed at confirmation)");
        }
        Some(record.state)
    }

    /// ENTRY -> EXIT; the label only, tracking continues
    pub fn mark_exit(&mut self, code: &str) -> bool {
        match self.records.get_mut(code) {
            Some(record) if record.state == LifecycleState::Entry => {
                record.state = LifecycleState::Exit;
                tracing::info!(code, "ENTRY -> EXIT");
                true
            }
            _ => false,
        }
    }

    /// Return an instrument to NONE after its position was cleared
    ///
    /// The cooldown anchor is kept.
    pub fn release(&mut self, code: &str) {
        if let Some(record) = self.records.get_mut(code) {
            record.state = LifecycleState::None;
            record.pending_confirm_deadline = None;
        }
    }

    /// Abort every pending confirmation (CONFIRM -> READY)
    ///
    /// Returns the affected codes, sorted.
    pub fn cancel_pending(&mut self) -> Vec<String> {
        let mut cancelled = Vec::new();
        for (code, record) in self.records.iter_mut() {
            if record.state == LifecycleState::Confirm {
                record.state = LifecycleState::Ready;
                record.pending_confirm_deadline = None;
                cancelled.push(code.clone());
            }
        }
        cancelled.sort();
        cancelled
    }

    /// Drop all records, including cooldown history
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Number of instruments with a record
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no instrument has a record
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for LifecycleMachine {
    fn default() -> Self {
        Self::new(LifecycleConfig::default())
    }
}
