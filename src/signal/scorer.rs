//! Composite momentum/flow scoring

use super::{ScoreOutcome, ScoreResult, ScoringWeights, Unscoreable};
use crate::tick::TickStore;
use crate::window::{AnalysisWindow, WindowAggregator};
use chrono::{DateTime, Utc};

/// Guards the flow ratio against an all-zero baseline
pub const FLOW_EPSILON: f64 = 1e-12;

/// Number of 60s slices in the long window, used to average its turnover
const LONG_WINDOW_SLICES: f64 = 3.0;

/// Scores instruments from their windowed aggregates
///
/// The score only ranks candidates; eligibility is decided separately by
/// the entry gate.
#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    weights: ScoringWeights,
}

impl SignalScorer {
    /// Create a scorer with the given coefficients
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Current coefficients
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one instrument at `now`
    ///
    /// The 60s window is mandatory. A missing 15s window counts as zero
    /// short-term momentum and a missing 180s window falls back to the 60s
    /// turnover as the baseline.
    pub fn score(&self, store: &TickStore, code: &str, now: DateTime<Utc>) -> ScoreOutcome {
        let latest = match store.latest(code) {
            Some(tick) => *tick,
            None => return ScoreOutcome::Unscoreable(Unscoreable::NoQuote),
        };

        let aggregator = WindowAggregator::new(store);
        let medium = match aggregator.window(code, AnalysisWindow::Medium, now) {
            Some(stat) => stat,
            None => {
                let samples = store
                    .ticks_since(code, AnalysisWindow::Medium.duration(), now)
                    .count();
                return ScoreOutcome::Unscoreable(Unscoreable::InsufficientHistory { samples });
            }
        };
        let short = aggregator.window(code, AnalysisWindow::Short, now);
        let long = aggregator.window(code, AnalysisWindow::Long, now);

        let mom15 = short.map_or(0.0, |s| s.momentum_pct);
        let mom60 = medium.momentum_pct;

        let baseline = long.map_or(medium.turnover_sum, |l| l.turnover_sum / LONG_WINDOW_SLICES);
        let flow_ratio = medium.turnover_sum / (baseline + FLOW_EPSILON);

        let (score, heat) = self.composite(mom15, mom60, flow_ratio, latest.daily_change_pct);

        ScoreOutcome::Scored(ScoreResult {
            code: code.to_string(),
            price: latest.price,
            daily_change_pct: latest.daily_change_pct,
            mom15,
            mom60,
            has_short_window: short.is_some(),
            has_long_window: long.is_some(),
            flow_ratio,
            turnover60: medium.turnover_sum,
            heat,
            score,
            scored_at: now,
        })
    }

    /// Composite score and heat penalty from the raw inputs
    pub fn composite(&self, mom15: f64, mom60: f64, flow_ratio: f64, daily_change_pct: f64) -> (f64, f64) {
        let w = &self.weights;

        let mom60_term = clamp(mom60 / w.mom60_scale, -1.0, w.momentum_cap);
        let mom15_term = clamp(mom15 / w.mom15_scale, -1.0, w.momentum_cap);
        let accel_term = clamp(
            (mom15 - mom60 * w.accel_mom60_factor) / w.accel_scale,
            -1.0,
            w.accel_cap,
        );
        let flow_term = clamp((flow_ratio + 1.0).log2(), 0.0, w.flow_cap);
        let daily_term = clamp(daily_change_pct / w.daily_scale, -1.0, w.daily_cap);

        let mut heat = 0.0;
        if mom15 > w.heat_mom15_threshold {
            heat += w.heat_mom15_penalty;
        }
        if mom60 > w.heat_mom60_threshold {
            heat += w.heat_mom60_penalty;
        }

        let score = w.mom60_weight * mom60_term
            + w.mom15_weight * mom15_term
            + w.accel_weight * accel_term
            + w.flow_weight * flow_term
            + w.daily_weight * daily_term
            - heat;

        (score, heat)
    }
}

fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}
