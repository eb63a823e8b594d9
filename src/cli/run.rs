//! Run command implementation

use crate::alert::{Alert, BroadcastSink, LogSink, MultiSink, NotificationSink};
use crate::config::{Config, SourceKind};
use crate::driver::RadarService;
use crate::radar::RadarSnapshot;
use crate::source::{FallbackSource, HttpSource, HttpSourceConfig, Market, SyntheticSource};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Use synthetic data instead of the HTTP source
    #[arg(long)]
    pub synthetic: bool,

    /// Market to scan (kospi or kosdaq)
    #[arg(long)]
    pub market: Option<Market>,

    /// Number of candidates to rank
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Poll interval in milliseconds
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

impl RunArgs {
    /// Fold command line overrides into the file configuration
    pub fn apply(&self, config: &mut Config) {
        if self.synthetic {
            config.source.kind = SourceKind::Synthetic;
        }
        if let Some(market) = self.market {
            config.radar.market = market;
        }
        if let Some(top_k) = self.top_k {
            config.radar.top_k = top_k;
        }
        if let Some(poll_ms) = self.poll_ms {
            config.radar.poll_interval_ms = poll_ms;
        }
    }

    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        self.apply(&mut config);
        config.validate()?;

        let alerts = Arc::new(BroadcastSink::default());
        let mut alert_rx = alerts.subscribe();
        let sink = MultiSink::new().with(Arc::new(LogSink)).with(alerts.clone());
        let service = build_service(&config, Arc::new(sink))?;

        service.start(config.clone()).await?;
        tracing::info!(
            market = %config.radar.market,
            source = ?config.source.kind,
            top_k = config.radar.top_k,
            "Radar running, press Ctrl-C to stop"
        );

        let deadline = self
            .duration_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        let mut refresh = tokio::time::interval(config.radar.poll_interval());
        let mut last_cycle = 0;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                    break;
                }
                _ = wait_until(deadline) => {
                    tracing::info!("Run duration elapsed");
                    break;
                }
                received = alert_rx.recv() => match received {
                    Ok(alert) => print_alert(&alert),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Alert printer fell behind");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = refresh.tick() => {
                    let snapshot = service.snapshot().await;
                    if snapshot.cycle != last_cycle {
                        last_cycle = snapshot.cycle;
                        print_snapshot(&snapshot);
                    }
                }
            }
        }

        service.stop().await?;
        Ok(())
    }
}

/// Wire the configured data source into a service
fn build_service(config: &Config, sink: Arc<dyn NotificationSink>) -> anyhow::Result<RadarService> {
    let synthetic = SyntheticSource::new(config.source.seed);

    let service = match config.source.kind {
        SourceKind::Synthetic => RadarService::from_source(config.clone(), synthetic, sink),
        SourceKind::Http => {
            let http = HttpSource::new(HttpSourceConfig {
                base_url: config.source.base_url.clone(),
                timeout: config.radar.fetch_timeout(),
            })?;
            if config.source.fallback_to_synthetic {
                let source = FallbackSource::new(http, synthetic, config.radar.fetch_timeout());
                RadarService::from_source(config.clone(), source, sink)
            } else {
                RadarService::from_source(config.clone(), http, sink)
            }
        }
    };

    Ok(service)
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn print_alert(alert: &Alert) {
    println!(
        ">> [{}] {} | {}",
        alert.timestamp.format("%H:%M:%S"),
        alert.title,
        alert.body
    );
}

fn print_snapshot(snapshot: &RadarSnapshot) {
    let at = snapshot
        .taken_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    println!("\n[{}] #{} {}", at, snapshot.cycle, snapshot.headline());

    for c in &snapshot.candidates {
        let gate = match &c.gate_reject {
            None => "pass".to_string(),
            Some(reason) => reason.clone(),
        };
        println!(
            "  {}. {:<12} {:>6} {:>9.0} {:>+6.2}% 15s {:>+5.2}% 60s {:>+5.2}% x{:<5.2} score {:>6.2} {:<8} {}",
            c.rank,
            c.name,
            c.code,
            c.price,
            c.daily_change_pct,
            c.mom15,
            c.mom60,
            c.flow_ratio,
            c.score,
            c.state,
            gate
        );
    }

    for p in &snapshot.positions {
        println!(
            "  * {:<12} {:>6} entry {:>9.0} last {:>9.0} ret {:>+6.2}% peak {:>+6.2}% {}",
            p.name, p.code, p.entry_price, p.last_price, p.return_pct, p.peak_return_pct, p.state
        );
    }
}
