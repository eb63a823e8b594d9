//! Data source types

use crate::tick::TickOrigin;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Market segment the universe is ranked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Kospi,
    #[default]
    Kosdaq,
}

impl Market {
    /// Identifier used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kospi" => Ok(Market::Kospi),
            "kosdaq" => Ok(Market::Kosdaq),
            other => Err(format!("unknown market '{}' (expected kospi or kosdaq)", other)),
        }
    }
}

/// Instrument display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentMeta {
    pub code: String,
    pub name: String,
}

/// Last price snapshot for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub price: f64,
    /// Change versus the previous close in percent
    pub daily_change_pct: f64,
}

/// Where a response came from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataOrigin {
    /// The configured source answered
    #[default]
    Primary,
    /// The primary failed and the fallback answered
    Fallback { reason: String },
}

impl DataOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DataOrigin::Fallback { .. })
    }

    /// Origin tag for the ticks built from this response
    pub fn tick_origin(&self) -> TickOrigin {
        match self {
            DataOrigin::Primary => TickOrigin::Primary,
            DataOrigin::Fallback { .. } => TickOrigin::Fallback,
        }
    }
}

/// Ranked candidate universe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    /// Candidate codes in rank order
    pub candidate_codes: Vec<String>,
    pub metadata: Vec<InstrumentMeta>,
    /// Quotes delivered with the ranking, if any
    pub initial_quotes: Vec<Quote>,
    pub origin: DataOrigin,
}

/// Quotes returned for one poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteBatch {
    pub quotes: Vec<Quote>,
    pub origin: DataOrigin,
}

/// Data source failures
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success HTTP status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// Payload could not be decoded
    #[error("Failed to decode payload: {0}")]
    Decode(String),
    /// The source answered with `ok = false`
    #[error("Source error: {0}")]
    Api(String),
    /// No answer within the fetch timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}
