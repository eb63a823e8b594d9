//! Configuration types for quote-radar
//!
//! Every section and field has a default, so a partial TOML file (or none at
//! all) is valid. [`Config::validate`] runs before the radar starts.

use crate::lifecycle::LifecycleConfig;
use crate::position::ExitConfig;
use crate::signal::{GateThresholds, ScoringWeights};
use crate::source::Market;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside its accepted range
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub radar: RadarConfig,
    pub gate: GateThresholds,
    pub lifecycle: LifecycleConfig,
    pub scoring: ScoringWeights,
    pub exit: ExitConfig,
    pub source: SourceConfig,
    pub telemetry: TelemetryConfig,
}

/// Poll loop and universe configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Market segment to rank
    pub market: Market,
    /// Number of top-scored candidates considered for entry
    pub top_k: usize,
    /// Size of the ranking the universe is picked from
    pub top_n: usize,
    /// Number of instruments polled from the ranking
    pub watch_count: usize,
    /// Poll interval (milliseconds)
    pub poll_interval_ms: u64,
    /// Universe re-rank interval (seconds)
    pub universe_refresh_secs: u64,
    /// Per-request timeout for the data source (milliseconds)
    pub fetch_timeout_ms: u64,
    /// Maximum codes per quote request
    pub max_quote_batch: usize,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            market: Market::Kosdaq,
            top_k: 2,
            top_n: 30,
            watch_count: 15,
            poll_interval_ms: 1_500,
            universe_refresh_secs: 60,
            fetch_timeout_ms: 3_000,
            max_quote_batch: 30,
        }
    }
}

impl RadarConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn universe_refresh(&self) -> Duration {
        Duration::from_secs(self.universe_refresh_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Which data source backs the radar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// KIS-style HTTP proxy
    #[default]
    Http,
    /// Seeded random walk
    Synthetic,
}

/// Data source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Origin hosting the quote proxy
    pub base_url: String,
    /// Answer from synthetic data when the HTTP source fails
    pub fallback_to_synthetic: bool,
    /// Seed for synthetic data; random when unset
    pub seed: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Http,
            base_url: "http://localhost:8888".to_string(),
            fallback_to_synthetic: true,
            seed: None,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter when RUST_LOG is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

fn check_range<T>(field: &str, value: T, lo: T, hi: T) -> Result<(), ConfigError>
where
    T: PartialOrd + Display + Copy,
{
    if value < lo || value > hi {
        return Err(ConfigError::invalid(
            field,
            format!("{} is outside {}..={}", value, lo, hi),
        ));
    }
    Ok(())
}

fn check_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::invalid(field, "must be a finite number"));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load and validate
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside their accepted ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radar = &self.radar;
        check_range("radar.top_k", radar.top_k, 1, 10)?;
        check_range("radar.top_n", radar.top_n, 10, 30)?;
        check_range("radar.watch_count", radar.watch_count, 5, 30)?;
        if radar.watch_count > radar.top_n {
            return Err(ConfigError::invalid(
                "radar.watch_count",
                format!("{} exceeds top_n ({})", radar.watch_count, radar.top_n),
            ));
        }
        check_range("radar.poll_interval_ms", radar.poll_interval_ms, 500, 5_000)?;
        if radar.universe_refresh_secs < 10 {
            return Err(ConfigError::invalid(
                "radar.universe_refresh_secs",
                "must be at least 10",
            ));
        }
        check_range("radar.fetch_timeout_ms", radar.fetch_timeout_ms, 500, 30_000)?;
        check_range("radar.max_quote_batch", radar.max_quote_batch, 1, 100)?;

        check_finite("gate.min_flow", self.gate.min_flow)?;
        check_range("gate.min_flow", self.gate.min_flow, 1.0, 4.0)?;
        check_finite("gate.min_mom60", self.gate.min_mom60)?;
        check_range("gate.min_mom60", self.gate.min_mom60, -2.0, 5.0)?;
        check_finite("gate.min_mom15", self.gate.min_mom15)?;
        check_range("gate.min_mom15", self.gate.min_mom15, -5.0, 5.0)?;

        check_range(
            "lifecycle.confirm_delay_ms",
            self.lifecycle.confirm_delay_ms,
            2_000,
            10_000,
        )?;
        check_range("lifecycle.cooldown_minutes", self.lifecycle.cooldown_minutes, 1, 30)?;

        for (name, value) in self.scoring.entries() {
            check_finite(&format!("scoring.{}", name), value)?;
        }
        for (name, value) in [
            ("scoring.mom60_scale", self.scoring.mom60_scale),
            ("scoring.mom15_scale", self.scoring.mom15_scale),
            ("scoring.accel_scale", self.scoring.accel_scale),
            ("scoring.daily_scale", self.scoring.daily_scale),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::invalid(name, "must be positive"));
            }
        }

        let exit = &self.exit;
        for (name, value) in [
            ("exit.first_target_pct", exit.first_target_pct),
            ("exit.second_target_pct", exit.second_target_pct),
            ("exit.fade_mom15", exit.fade_mom15),
            ("exit.weak_mom60", exit.weak_mom60),
            ("exit.weak_min_return_pct", exit.weak_min_return_pct),
            ("exit.flow_collapse_ratio", exit.flow_collapse_ratio),
            ("exit.trail_activation_pct", exit.trail_activation_pct),
            ("exit.trail_drawdown_pct", exit.trail_drawdown_pct),
        ] {
            check_finite(name, value)?;
        }
        if exit.first_target_pct <= 0.0 {
            return Err(ConfigError::invalid("exit.first_target_pct", "must be positive"));
        }
        if exit.second_target_pct <= exit.first_target_pct {
            return Err(ConfigError::invalid(
                "exit.second_target_pct",
                "must be above first_target_pct",
            ));
        }
        check_range("exit.flow_collapse_ratio", exit.flow_collapse_ratio, 0.1, 4.0)?;
        check_range("exit.trail_activation_pct", exit.trail_activation_pct, 0.1, 20.0)?;
        check_range("exit.trail_drawdown_pct", exit.trail_drawdown_pct, 0.1, 10.0)?;
        check_range("exit.exit_debounce_secs", exit.exit_debounce_secs, 1, 3_600)?;

        if self.source.kind == SourceKind::Http && self.source.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("source.base_url", "must not be empty"));
        }

        Ok(())
    }
}
