//! Prometheus metrics

use crate::alert::AlertKind;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Which fetch failed
#[derive(Debug, Clone, Copy)]
pub enum FetchKind {
    Universe,
    Quotes,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Instruments with tick history
    TrackedInstruments,
    /// Instruments scoreable this cycle
    ScoreableInstruments,
    /// Candidates in the current universe
    UniverseSize,
    /// Tracked positions
    OpenPositions,
    /// Pending confirmations
    PendingConfirmations,
}

/// Start the Prometheus scrape endpoint
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record one completed poll cycle
pub fn record_cycle(duration: Duration) {
    counter!("radar_cycles_total").increment(1);
    histogram!("radar_cycle_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

/// Record a failed fetch
pub fn record_fetch_failure(kind: FetchKind) {
    let kind = match kind {
        FetchKind::Universe => "universe",
        FetchKind::Quotes => "quotes",
    };
    counter!("radar_fetch_failures_total", "kind" => kind).increment(1);
}

/// Record an emitted alert
pub fn record_alert(kind: AlertKind) {
    counter!("radar_alerts_total", "kind" => kind.as_str()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::TrackedInstruments => "radar_tracked_instruments",
        GaugeMetric::ScoreableInstruments => "radar_scoreable_instruments",
        GaugeMetric::UniverseSize => "radar_universe_size",
        GaugeMetric::OpenPositions => "radar_open_positions",
        GaugeMetric::PendingConfirmations => "radar_pending_confirmations",
    };
    gauge!(name).set(value);
}
