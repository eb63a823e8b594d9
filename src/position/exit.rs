//! Exit engine

use super::{ExitConfig, ExitTrigger, Position, PositionEvent, TargetLevel};
use crate::signal::ScoreResult;
use chrono::{DateTime, Utc};

/// Evaluates tracked positions against the latest score every cycle
#[derive(Debug, Clone, Default)]
pub struct ExitEngine {
    config: ExitConfig,
}

impl ExitEngine {
    /// Create an exit engine with the given thresholds
    pub fn new(config: ExitConfig) -> Self {
        Self { config }
    }

    /// Current thresholds
    pub fn config(&self) -> &ExitConfig {
        &self.config
    }

    /// Update a position with the latest score and collect its events
    ///
    /// Target events fire once per position. All exit triggers of one
    /// cycle are reported together in a single event, at most once per
    /// debounce window.
    pub fn evaluate(
        &self,
        position: &mut Position,
        score: &ScoreResult,
        now: DateTime<Utc>,
    ) -> Vec<PositionEvent> {
        let mut events = Vec::new();
        let price = score.price;

        position.last_price = price;
        if price > position.peak_price {
            position.peak_price = price;
        }

        let return_pct = position.return_at(price);

        if !position.hit_first_target && return_pct >= self.config.first_target_pct {
            position.hit_first_target = true;
            events.push(PositionEvent::TargetReached {
                level: TargetLevel::First,
                target_pct: self.config.first_target_pct,
                return_pct,
                price,
            });
        }
        if !position.hit_second_target && return_pct >= self.config.second_target_pct {
            position.hit_second_target = true;
            events.push(PositionEvent::TargetReached {
                level: TargetLevel::Second,
                target_pct: self.config.second_target_pct,
                return_pct,
                price,
            });
        }

        let triggers = self.triggers(position, score, return_pct);
        if triggers.is_empty() {
            return events;
        }

        let debounced = position
            .last_exit_alert
            .is_some_and(|last| now - last <= self.config.exit_debounce());
        if debounced {
            tracing::trace!(code = %position.code, "Exit alert debounced");
            return events;
        }

        position.last_exit_alert = Some(now);
        events.push(PositionEvent::ExitAdvised {
            triggers,
            return_pct,
            price,
        });
        events
    }

    fn triggers(&self, position: &Position, score: &ScoreResult, return_pct: f64) -> Vec<ExitTrigger> {
        let mut triggers = Vec::new();

        if score.mom15 < self.config.fade_mom15 {
            triggers.push(ExitTrigger::MomentumFading { mom15: score.mom15 });
        }
        if score.mom60 < self.config.weak_mom60 && return_pct > self.config.weak_min_return_pct {
            triggers.push(ExitTrigger::MediumTermWeakening { mom60: score.mom60 });
        }
        if score.flow_ratio < self.config.flow_collapse_ratio {
            triggers.push(ExitTrigger::FlowCollapse {
                flow_ratio: score.flow_ratio,
            });
        }

        let peak_return_pct = position.peak_return_pct();
        let drawdown_pct = peak_return_pct - return_pct;
        if peak_return_pct >= self.config.trail_activation_pct
            && drawdown_pct >= self.config.trail_drawdown_pct
        {
            triggers.push(ExitTrigger::TrailingStop {
                peak_return_pct,
                drawdown_pct,
            });
        }

        triggers
    }
}
