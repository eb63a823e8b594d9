//! Window aggregation module
//!
//! Momentum and turnover sums over fixed look-back windows of the tick store.

mod aggregator;

pub use aggregator::{WindowAggregator, WindowStat};

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// The fixed analysis windows used by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisWindow {
    /// 15 seconds
    Short,
    /// 60 seconds
    Medium,
    /// 180 seconds
    Long,
}

impl AnalysisWindow {
    /// Window length in seconds
    pub fn seconds(&self) -> i64 {
        match self {
            AnalysisWindow::Short => 15,
            AnalysisWindow::Medium => 60,
            AnalysisWindow::Long => 180,
        }
    }

    /// Window length
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.seconds())
    }
}
