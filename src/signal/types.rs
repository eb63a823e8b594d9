//! Signal types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-instrument score for the current poll cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Instrument code
    pub code: String,
    /// Latest observed price
    pub price: f64,
    /// Latest daily change in percent
    pub daily_change_pct: f64,
    /// 15s momentum in percent (0 when the short window is not yet valid)
    pub mom15: f64,
    /// 60s momentum in percent
    pub mom60: f64,
    /// Whether the 15s window had enough samples
    pub has_short_window: bool,
    /// Whether the 180s window had enough samples
    pub has_long_window: bool,
    /// 60s turnover relative to the rolling baseline
    pub flow_ratio: f64,
    /// Turnover-estimate sum over 60s
    pub turnover60: f64,
    /// Penalty applied for already-extended moves
    pub heat: f64,
    /// Composite ranking score
    pub score: f64,
    /// When the score was computed
    pub scored_at: DateTime<Utc>,
}

/// Why an instrument could not be scored this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unscoreable {
    /// Nothing has been recorded for the instrument
    NoQuote,
    /// The 60s window holds fewer than two ticks
    InsufficientHistory { samples: usize },
}

impl fmt::Display for Unscoreable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unscoreable::NoQuote => write!(f, "no quote yet"),
            Unscoreable::InsufficientHistory { samples } => {
                write!(f, "insufficient history ({} samples in 60s)", samples)
            }
        }
    }
}

/// Outcome of scoring one instrument
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(ScoreResult),
    Unscoreable(Unscoreable),
}

impl ScoreOutcome {
    /// The score, if the instrument was scoreable
    pub fn scored(self) -> Option<ScoreResult> {
        match self {
            ScoreOutcome::Scored(result) => Some(result),
            ScoreOutcome::Unscoreable(_) => None,
        }
    }

    /// Check if the instrument was scoreable
    pub fn is_scored(&self) -> bool {
        matches!(self, ScoreOutcome::Scored(_))
    }
}

/// Coefficients of the composite score
///
/// Each momentum-like input is divided by its scale and clamped before
/// weighting. Missing fields in configuration fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub mom60_weight: f64,
    pub mom60_scale: f64,
    pub mom15_weight: f64,
    pub mom15_scale: f64,
    /// Upper clamp for both momentum terms
    pub momentum_cap: f64,

    pub accel_weight: f64,
    /// Share of the 60s momentum subtracted from the 15s momentum
    pub accel_mom60_factor: f64,
    pub accel_scale: f64,
    pub accel_cap: f64,

    pub flow_weight: f64,
    pub flow_cap: f64,

    pub daily_weight: f64,
    pub daily_scale: f64,
    pub daily_cap: f64,

    pub heat_mom15_threshold: f64,
    pub heat_mom15_penalty: f64,
    pub heat_mom60_threshold: f64,
    pub heat_mom60_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            mom60_weight: 1.4,
            mom60_scale: 1.2,
            mom15_weight: 1.0,
            mom15_scale: 0.6,
            momentum_cap: 1.6,
            accel_weight: 1.2,
            accel_mom60_factor: 0.25,
            accel_scale: 0.25,
            accel_cap: 1.8,
            flow_weight: 1.6,
            flow_cap: 2.6,
            daily_weight: 0.35,
            daily_scale: 3.0,
            daily_cap: 1.5,
            heat_mom15_threshold: 0.8,
            heat_mom15_penalty: 0.8,
            heat_mom60_threshold: 2.2,
            heat_mom60_penalty: 1.0,
        }
    }
}

impl ScoringWeights {
    /// All coefficients as (name, value) pairs, for validation
    pub fn entries(&self) -> [(&'static str, f64); 18] {
        [
            ("mom60_weight", self.mom60_weight),
            ("mom60_scale", self.mom60_scale),
            ("mom15_weight", self.mom15_weight),
            ("mom15_scale", self.mom15_scale),
            ("momentum_cap", self.momentum_cap),
            ("accel_weight", self.accel_weight),
            ("accel_mom60_factor", self.accel_mom60_factor),
            ("accel_scale", self.accel_scale),
            ("accel_cap", self.accel_cap),
            ("flow_weight", self.flow_weight),
            ("flow_cap", self.flow_cap),
            ("daily_weight", self.daily_weight),
            ("daily_scale", self.daily_scale),
            ("daily_cap", self.daily_cap),
            ("heat_mom15_threshold", self.heat_mom15_threshold),
            ("heat_mom15_penalty", self.heat_mom15_penalty),
            ("heat_mom60_threshold", self.heat_mom60_threshold),
            ("heat_mom60_penalty", self.heat_mom60_penalty),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscoreable_display() {
        let reason = Unscoreable::InsufficientHistory { samples: 1 };
        assert_eq!(reason.to_string(), "insufficient history (1 samples in 60s)");
        assert_eq!(Unscoreable::NoQuote.to_string(), "no quote yet");
    }

    #[test]
    fn test_outcome_scored() {
        let outcome = ScoreOutcome::Unscoreable(Unscoreable::NoQuote);
        assert!(!outcome.is_scored());
        assert!(outcome.scored().is_none());
    }

    #[test]
    fn test_weights_partial_deserialize() {
        let weights: ScoringWeights = toml::from_str("flow_weight = 2.0").unwrap();
        assert_eq!(weights.flow_weight, 2.0);
        assert_eq!(weights.mom60_weight, 1.4);
    }
}
