//! Per-cycle radar core
//!
//! Everything here is synchronous: the driver feeds quotes in, runs a cycle
//! and fires due confirmations while holding the radar exclusively, so the
//! per-instrument maps need no locking of their own.

use super::snapshot::{CandidateView, FeedStatus, PositionView, RadarSnapshot};
use crate::alert::Alert;
use crate::config::Config;
use crate::lifecycle::{LifecycleMachine, LifecycleState, ScheduleOutcome};
use crate::position::{ExitEngine, PositionEvent, PositionTracker};
use crate::signal::{top_k, EntryGate, GateResult, ScoreOutcome, ScoreResult, SignalScorer};
use crate::source::{InstrumentMeta, Quote};
use crate::tick::{TickOrigin, TickStore};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Alerts kept in the in-memory log
pub const ALERT_LOG_CAPACITY: usize = 200;

/// Alerts shown in a snapshot
const SNAPSHOT_ALERTS: usize = 20;

/// What one cycle produced
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Confirmations scheduled this cycle, with their deadlines
    pub scheduled: Vec<(String, DateTime<Utc>)>,
    /// Target and exit alerts raised this cycle
    pub alerts: Vec<Alert>,
    /// Instruments with a valid score
    pub scored: usize,
    /// Instruments still warming up
    pub unscoreable: usize,
}

/// The radar's state and per-cycle pipeline
pub struct Radar {
    ticks: TickStore,
    scorer: SignalScorer,
    gate: EntryGate,
    lifecycle: LifecycleMachine,
    positions: PositionTracker,
    exits: ExitEngine,
    /// Code -> display name
    instruments: HashMap<String, String>,
    /// Scores from the latest cycle
    scores: BTreeMap<String, ScoreResult>,
    /// Top-K from the latest cycle
    top: Vec<ScoreResult>,
    /// Newest first
    alerts: VecDeque<Alert>,
    top_k: usize,
    cycle: u64,
    last_cycle_at: Option<DateTime<Utc>>,
}

impl Radar {
    pub fn new(config: &Config) -> Self {
        Self {
            ticks: TickStore::new(),
            scorer: SignalScorer::new(config.scoring.clone()),
            gate: EntryGate::new(config.gate.clone()),
            lifecycle: LifecycleMachine::new(config.lifecycle.clone()),
            positions: PositionTracker::new(),
            exits: ExitEngine::new(config.exit.clone()),
            instruments: HashMap::new(),
            scores: BTreeMap::new(),
            top: Vec::new(),
            alerts: VecDeque::with_capacity(ALERT_LOG_CAPACITY),
            top_k: config.radar.top_k,
            cycle: 0,
            last_cycle_at: None,
        }
    }

    /// Swap in new thresholds, keeping all state
    pub fn apply_config(&mut self, config: &Config) {
        self.scorer = SignalScorer::new(config.scoring.clone());
        self.gate = EntryGate::new(config.gate.clone());
        self.lifecycle.set_config(config.lifecycle.clone());
        self.exits = ExitEngine::new(config.exit.clone());
        self.top_k = config.radar.top_k;
    }

    /// Add instruments to the directory; known names are only overwritten by
    /// non-empty ones
    pub fn register_instruments(&mut self, metadata: &[InstrumentMeta]) {
        for meta in metadata {
            let name = self.instruments.entry(meta.code.clone()).or_default();
            if !meta.name.is_empty() {
                *name = meta.name.clone();
            }
        }
    }

    /// Display name, falling back to the code
    pub fn name<'a>(&'a self, code: &'a str) -> &'a str {
        match self.instruments.get(code) {
            Some(name) if !name.is_empty() => name,
            _ => code,
        }
    }

    /// Record a batch of primary quotes
    ///
    /// Returns the number of ticks accepted.
    pub fn ingest(&mut self, quotes: &[Quote], now: DateTime<Utc>) -> usize {
        self.ingest_from(quotes, TickOrigin::Primary, now)
    }

    /// Record a batch of quotes from a given origin
    ///
    /// Fallback quotes only feed instruments without live primary history.
    /// A position opened on fallback prices is dropped once primary data
    /// for it returns. Returns the number of ticks accepted.
    pub fn ingest_from(&mut self, quotes: &[Quote], origin: TickOrigin, now: DateTime<Utc>) -> usize {
        let mut accepted = 0;
        for quote in quotes {
            self.instruments.entry(quote.code.clone()).or_default();

            if origin == TickOrigin::Primary
                && self.ticks.origin(&quote.code) == Some(TickOrigin::Fallback)
                && self.positions.contains(&quote.code)
            {
                tracing::warn!(code = %quote.code, "Dropping position opened on fallback data");
                self.clear_position(&quote.code);
            }

            if self
                .ticks
                .record_from(&quote.code, quote.price, quote.daily_change_pct, origin, now)
                .is_some()
            {
                accepted += 1;
            }
        }
        if accepted < quotes.len() && origin == TickOrigin::Fallback {
            tracing::debug!(
                skipped = quotes.len() - accepted,
                "Fallback quotes kept out of primary history"
            );
        }
        self.ticks.prune_older_than(now - self.ticks.retention());
        accepted
    }

    /// Score everything, drive the lifecycle for the top-K and check exits
    pub fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        self.scores.clear();
        for code in self.ticks.codes() {
            match self.scorer.score(&self.ticks, &code, now) {
                ScoreOutcome::Scored(score) => {
                    self.scores.insert(code, score);
                }
                ScoreOutcome::Unscoreable(reason) => {
                    tracing::trace!(code = %code, %reason, "Not scoreable yet");
                    report.unscoreable += 1;
                }
            }
        }
        report.scored = self.scores.len();

        self.top = top_k(self.scores.values().cloned(), self.top_k);

        for candidate in &self.top {
            let code = candidate.code.as_str();
            match self.gate.check(candidate) {
                GateResult::Pass => {}
                GateResult::Reject(reason) => {
                    tracing::debug!(code, score = candidate.score, %reason, "Gate rejected");
                    continue;
                }
            }

            let has_position = self.positions.contains(code);
            self.lifecycle.mark_ready(code, has_position);
            match self.lifecycle.try_schedule(code, has_position, now) {
                ScheduleOutcome::Scheduled { deadline } => {
                    report.scheduled.push((code.to_string(), deadline));
                }
                ScheduleOutcome::CoolingDown { until } => {
                    tracing::trace!(code, %until, "Cooling down");
                }
                ScheduleOutcome::AlreadyPending | ScheduleOutcome::HasPosition => {}
            }
        }

        for code in self.positions.codes() {
            // Exit checks need a fresh score; skip instruments without one
            let Some(score) = self.scores.get(&code) else {
                continue;
            };
            let Some(position) = self.positions.get_mut(&code) else {
                continue;
            };

            for event in self.exits.evaluate(position, score, now) {
                let name = match self.instruments.get(&code) {
                    Some(name) if !name.is_empty() => name.as_str(),
                    _ => code.as_str(),
                };
                let alert = match event {
                    PositionEvent::TargetReached {
                        target_pct,
                        return_pct,
                        price,
                        ..
                    } => Alert::target(&code, name, target_pct, return_pct, price, now),
                    PositionEvent::ExitAdvised {
                        triggers,
                        return_pct,
                        price,
                    } => {
                        self.lifecycle.mark_exit(&code);
                        Alert::exit(&code, name, triggers, return_pct, price, now)
                    }
                };
                report.alerts.push(alert);
            }
        }

        for alert in &report.alerts {
            self.log_alert(alert.clone());
        }

        self.cycle += 1;
        self.last_cycle_at = Some(now);
        report
    }

    /// Resolve one pending confirmation against the latest ticks
    ///
    /// Returns the entry alert when the gate still passes. Does nothing if
    /// the instrument is no longer pending (for example after a reset).
    pub fn confirm(&mut self, code: &str, now: DateTime<Utc>) -> Option<Alert> {
        if !self.lifecycle.is_pending(code) {
            return None;
        }

        let score = self.scorer.score(&self.ticks, code, now).scored();
        let passed = match &score {
            Some(score) => match self.gate.check(score) {
                GateResult::Pass => true,
                GateResult::Reject(reason) => {
                    tracing::info!(code, %reason, "Confirmation failed");
                    false
                }
            },
            None => {
                tracing::info!(code, "Confirmation failed: not scoreable");
                false
            }
        };

        let state = self.lifecycle.resolve_confirmation(code, passed, now)?;
        if state != LifecycleState::Entry {
            return None;
        }
        let score = score?;

        self.positions.open(code, score.price, now);
        let alert = Alert::entry(self.name(code), &score);
        self.log_alert(alert.clone());
        Some(alert)
    }

    /// Resolve every confirmation whose deadline has passed
    pub fn confirm_due(&mut self, now: DateTime<Utc>) -> Vec<Alert> {
        self.lifecycle
            .due(now)
            .into_iter()
            .filter_map(|code| self.confirm(&code, now))
            .collect()
    }

    /// Abort all pending confirmations
    pub fn cancel_pending(&mut self) -> Vec<String> {
        self.lifecycle.cancel_pending()
    }

    /// Clear alerts, lifecycle records and positions
    ///
    /// Tick history and the instrument directory are kept.
    pub fn reset(&mut self) {
        self.lifecycle.reset();
        self.positions.clear();
        self.alerts.clear();
        self.scores.clear();
        self.top.clear();
        tracing::info!("Radar reset");
    }

    /// Stop tracking one position; its lifecycle returns to NONE
    pub fn clear_position(&mut self, code: &str) -> bool {
        if self.positions.remove(code).is_none() {
            return false;
        }
        self.lifecycle.release(code);
        tracing::info!(code, "Position cleared");
        true
    }

    fn log_alert(&mut self, alert: Alert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(ALERT_LOG_CAPACITY);
    }

    /// Codes with a tracked position
    pub fn position_codes(&self) -> Vec<String> {
        self.positions.codes()
    }

    pub fn ticks(&self) -> &TickStore {
        &self.ticks
    }

    pub fn lifecycle(&self) -> &LifecycleMachine {
        &self.lifecycle
    }

    pub fn positions(&self) -> &PositionTracker {
        &self.positions
    }

    /// Alert log, newest first
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Top-K from the latest cycle
    pub fn top(&self) -> &[ScoreResult] {
        &self.top
    }

    /// Score of an instrument in the latest cycle
    pub fn score(&self, code: &str) -> Option<&ScoreResult> {
        self.scores.get(code)
    }

    /// Completed cycles
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Read-only view of the latest cycle
    pub fn snapshot(&self, running: bool, feed: FeedStatus) -> RadarSnapshot {
        let candidates = self
            .top
            .iter()
            .enumerate()
            .map(|(i, score)| {
                let gate = self.gate.check(score);
                CandidateView {
                    rank: i + 1,
                    code: score.code.clone(),
                    name: self.name(&score.code).to_string(),
                    price: score.price,
                    daily_change_pct: score.daily_change_pct,
                    mom15: score.mom15,
                    mom60: score.mom60,
                    flow_ratio: score.flow_ratio,
                    turnover60: score.turnover60,
                    score: score.score,
                    heat: score.heat,
                    gate_passed: gate.passed(),
                    gate_reject: match gate {
                        GateResult::Pass => None,
                        GateResult::Reject(reason) => Some(reason.to_string()),
                    },
                    state: self.lifecycle.state(&score.code),
                }
            })
            .collect();

        let positions = self
            .positions
            .iter()
            .map(|p| {
                let score = self.scores.get(&p.code);
                PositionView {
                    code: p.code.clone(),
                    name: self.name(&p.code).to_string(),
                    entry_price: p.entry_price,
                    last_price: p.last_price,
                    peak_price: p.peak_price,
                    return_pct: p.return_pct(),
                    peak_return_pct: p.peak_return_pct(),
                    hit_first_target: p.hit_first_target,
                    hit_second_target: p.hit_second_target,
                    mom15: score.map(|s| s.mom15),
                    mom60: score.map(|s| s.mom60),
                    flow_ratio: score.map(|s| s.flow_ratio),
                    state: self.lifecycle.state(&p.code),
                    entry_time: p.entry_time,
                }
            })
            .collect();

        RadarSnapshot {
            running,
            feed,
            cycle: self.cycle,
            taken_at: self.last_cycle_at,
            tracked_instruments: self.ticks.instrument_count(),
            scoreable_instruments: self.scores.len(),
            candidates,
            positions,
            recent_alerts: self.alerts.iter().take(SNAPSHOT_ALERTS).cloned().collect(),
        }
    }
}
