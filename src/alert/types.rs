//! Alert types

use crate::position::ExitTrigger;
use crate::signal::ScoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Exit alert bodies list at most this many triggers
pub const MAX_TRIGGERS_IN_BODY: usize = 3;

/// Kind of alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Confirmed entry
    Entry,
    /// Advisory exit
    Exit,
    /// Profit target reached
    Target,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Entry => "entry",
            AlertKind::Exit => "exit",
            AlertKind::Target => "target",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert ID
    pub id: Uuid,
    pub kind: AlertKind,
    /// Instrument code
    pub code: String,
    /// Display name, falls back to the code
    pub name: String,
    pub title: String,
    pub body: String,
    /// Price that produced the alert
    pub price: f64,
    /// Every exit trigger that fired (empty for other kinds)
    pub triggers: Vec<ExitTrigger>,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Entry alert for a confirmed candidate
    pub fn entry(name: &str, score: &ScoreResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: AlertKind::Entry,
            code: score.code.clone(),
            name: name.to_string(),
            title: format!("ENTRY {} ({})", name, score.code),
            body: format!(
                "price {:.0} | score {:.2} | flow x{:.2} | 60s {:+.2}% | 15s {:+.2}%",
                score.price, score.score, score.flow_ratio, score.mom60, score.mom15
            ),
            price: score.price,
            triggers: Vec::new(),
            timestamp: score.scored_at,
        }
    }

    /// One-time profit target alert
    pub fn target(
        code: &str,
        name: &str,
        target_pct: f64,
        return_pct: f64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: AlertKind::Target,
            code: code.to_string(),
            name: name.to_string(),
            title: format!("TARGET +{:.0}% {} ({})", target_pct, name, code),
            body: format!("return {:+.2}% | price {:.0}", return_pct, price),
            price,
            triggers: Vec::new(),
            timestamp,
        }
    }

    /// Advisory exit alert carrying every trigger that fired
    pub fn exit(
        code: &str,
        name: &str,
        triggers: Vec<ExitTrigger>,
        return_pct: f64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let reasons: Vec<String> = triggers
            .iter()
            .take(MAX_TRIGGERS_IN_BODY)
            .map(|t| t.to_string())
            .collect();

        Self {
            id: Uuid::new_v4(),
            kind: AlertKind::Exit,
            code: code.to_string(),
            name: name.to_string(),
            title: format!("EXIT {} ({})", name, code),
            body: format!(
                "return {:+.2}% | price {:.0} | {}",
                return_pct,
                price,
                reasons.join(", ")
            ),
            price,
            triggers,
            timestamp,
        }
    }
}
