//! Signal module
//!
//! Scores instruments from their windowed aggregates, decides entry
//! eligibility and ranks the candidates of a poll cycle.

mod gate;
mod scorer;
mod selector;
mod types;

pub use gate::{EntryGate, GateReject, GateResult, GateThresholds};
pub use scorer::{SignalScorer, FLOW_EPSILON};
pub use selector::{rank_candidates, top_k};
pub use types::{ScoreOutcome, ScoreResult, ScoringWeights, Unscoreable};
