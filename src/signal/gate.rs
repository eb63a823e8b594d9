//! Entry gate

use super::ScoreResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of applying the entry gate to a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateResult {
    /// Instrument is eligible for confirmation
    Pass,
    /// Instrument rejected
    Reject(GateReject),
}

impl GateResult {
    /// Check if the gate passed
    pub fn passed(&self) -> bool {
        matches!(self, GateResult::Pass)
    }
}

/// Reason for gate rejection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateReject {
    /// Flow ratio below the minimum
    FlowTooWeak(f64),
    /// 60s momentum below the minimum
    MomentumTooWeak(f64),
    /// 15s momentum below the deceleration guard
    Decelerating(f64),
}

impl fmt::Display for GateReject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateReject::FlowTooWeak(ratio) => write!(f, "flow too weak (x{:.2})", ratio),
            GateReject::MomentumTooWeak(mom) => write!(f, "60s momentum too weak ({:+.2}%)", mom),
            GateReject::Decelerating(mom) => write!(f, "15s momentum fading ({:+.2}%)", mom),
        }
    }
}

/// Entry gate thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Minimum 60s flow ratio
    pub min_flow: f64,
    /// Minimum 60s momentum in percent
    pub min_mom60: f64,
    /// Minimum 15s momentum in percent (deceleration guard)
    pub min_mom15: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            min_flow: 1.20,
            min_mom60: 0.20,
            min_mom15: -0.05,
        }
    }
}

/// Eligibility check applied to scored candidates
#[derive(Debug, Clone, Default)]
pub struct EntryGate {
    thresholds: GateThresholds,
}

impl EntryGate {
    /// Create a gate with the given thresholds
    pub fn new(thresholds: GateThresholds) -> Self {
        Self { thresholds }
    }

    /// Current thresholds
    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    /// Apply all checks to a score
    pub fn check(&self, score: &ScoreResult) -> GateResult {
        if score.flow_ratio < self.thresholds.min_flow {
            return GateResult::Reject(GateReject::FlowTooWeak(score.flow_ratio));
        }
        if score.mom60 < self.thresholds.min_mom60 {
            return GateResult::Reject(GateReject::MomentumTooWeak(score.mom60));
        }
        if score.mom15 < self.thresholds.min_mom15 {
            return GateResult::Reject(GateReject::Decelerating(score.mom15));
        }
        GateResult::Pass
    }
}
