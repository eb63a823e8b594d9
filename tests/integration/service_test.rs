//! Integration tests for the poll driver, on paused tokio time

use async_trait::async_trait;
use quote_radar::alert::{Alert, AlertKind, BroadcastSink};
use quote_radar::config::Config;
use quote_radar::driver::{RadarError, RadarService};
use quote_radar::lifecycle::LifecycleState;
use quote_radar::radar::FeedStatus;
use quote_radar::source::{
    DataOrigin, FallbackSource, InstrumentMeta, Market, Quote, QuoteBatch, QuoteSource, SourceError,
    SyntheticSource, Universe, UniverseSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const CODE: &str = "123456";

/// One instrument: 120s flat, a 1% climb over 60s, then flat again
#[derive(Default)]
struct ScriptedSource {
    quote_calls: AtomicUsize,
    universe_calls: AtomicUsize,
    /// Universe requests after the first one fail
    universe_fails_after_first: bool,
    /// Quote requests from this call on fail
    quotes_fail_from: Option<usize>,
}

impl ScriptedSource {
    fn price(call: usize) -> f64 {
        if call < 80 {
            10_000.0
        } else {
            10_000.0 + 2.5 * (call - 79).min(40) as f64
        }
    }
}

#[async_trait]
impl UniverseSource for ScriptedSource {
    async fn rank_candidates(
        &self,
        _market: Market,
        _top_n: usize,
        _watch_count: usize,
    ) -> Result<Universe, SourceError> {
        let call = self.universe_calls.fetch_add(1, Ordering::SeqCst);
        if self.universe_fails_after_first && call > 0 {
            return Err(SourceError::Api("ranking unavailable".to_string()));
        }
        Ok(Universe {
            candidate_codes: vec![CODE.to_string()],
            metadata: vec![InstrumentMeta {
                code: CODE.to_string(),
                name: "Scripted".to_string(),
            }],
            initial_quotes: Vec::new(),
            origin: DataOrigin::Primary,
        })
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    async fn fetch_quotes(&self, _market: Market, codes: &[String]) -> Result<QuoteBatch, SourceError> {
        let call = self.quote_calls.fetch_add(1, Ordering::SeqCst);
        if self.quotes_fail_from.is_some_and(|from| call >= from) {
            return Err(SourceError::Status {
                status: 503,
                body: "maintenance".to_string(),
            });
        }
        Ok(QuoteBatch {
            quotes: codes
                .iter()
                .map(|code| Quote {
                    code: code.clone(),
                    price: Self::price(call),
                    daily_change_pct: 1.5,
                })
                .collect(),
            origin: DataOrigin::Primary,
        })
    }
}

/// Serves a universe but never a quote
struct BrokenQuotes {
    hang: bool,
}

#[async_trait]
impl UniverseSource for BrokenQuotes {
    async fn rank_candidates(
        &self,
        _market: Market,
        _top_n: usize,
        _watch_count: usize,
    ) -> Result<Universe, SourceError> {
        Ok(Universe {
            candidate_codes: vec![CODE.to_string()],
            ..Universe::default()
        })
    }
}

#[async_trait]
impl QuoteSource for BrokenQuotes {
    async fn fetch_quotes(&self, _market: Market, _codes: &[String]) -> Result<QuoteBatch, SourceError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(SourceError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        })
    }
}

struct NoUniverse;

#[async_trait]
impl UniverseSource for NoUniverse {
    async fn rank_candidates(
        &self,
        _market: Market,
        _top_n: usize,
        _watch_count: usize,
    ) -> Result<Universe, SourceError> {
        Err(SourceError::Api("market closed".to_string()))
    }
}

#[async_trait]
impl QuoteSource for NoUniverse {
    async fn fetch_quotes(&self, _market: Market, _codes: &[String]) -> Result<QuoteBatch, SourceError> {
        Ok(QuoteBatch::default())
    }
}

fn scripted_service(
    source: ScriptedSource,
    config: &Config,
) -> (RadarService, broadcast::Receiver<Alert>) {
    let sink = Arc::new(BroadcastSink::default());
    let rx = sink.subscribe();
    (RadarService::from_source(config.clone(), source, sink), rx)
}

fn drain(rx: &mut broadcast::Receiver<Alert>) -> Vec<Alert> {
    let mut alerts = Vec::new();
    while let Ok(alert) = rx.try_recv() {
        alerts.push(alert);
    }
    alerts
}

#[tokio::test(start_paused = true)]
async fn test_rise_produces_entry_alert() {
    let config = Config::default();
    let (service, mut rx) = scripted_service(ScriptedSource::default(), &config);
    service.start(config).await.unwrap();

    tokio::time::sleep(Duration::from_secs(200)).await;

    let alerts = drain(&mut rx);
    let entries: Vec<&Alert> = alerts.iter().filter(|a| a.kind == AlertKind::Entry).collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].code, CODE);
    assert!(entries[0].title.contains("Scripted"));

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.feed, FeedStatus::Live);
    assert_eq!(snapshot.positions.len(), 1);
    assert_eq!(snapshot.positions[0].name, "Scripted");

    service.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_confirmation() {
    let mut config = Config::default();
    config.lifecycle.confirm_delay_ms = 10_000;
    let (service, mut rx) = scripted_service(ScriptedSource::default(), &config);
    service.start(config).await.unwrap();

    let mut pending = false;
    for _ in 0..200 {
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let snapshot = service.snapshot().await;
        if snapshot
            .candidates
            .iter()
            .any(|c| c.state == LifecycleState::Confirm)
        {
            pending = true;
            break;
        }
    }
    assert!(pending, "a confirmation should have been scheduled");

    service.stop().await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(drain(&mut rx).iter().all(|a| a.kind != AlertKind::Entry));
    let snapshot = service.snapshot().await;
    assert!(!snapshot.running);
    assert!(snapshot.positions.is_empty());
    assert!(snapshot
        .candidates
        .iter()
        .all(|c| c.state != LifecycleState::Confirm));
}

#[tokio::test(start_paused = true)]
async fn test_reset_while_running() {
    let config = Config::default();
    let (service, mut rx) = scripted_service(ScriptedSource::default(), &config);
    service.start(config).await.unwrap();

    tokio::time::sleep(Duration::from_secs(200)).await;
    assert_eq!(service.snapshot().await.positions.len(), 1);
    drain(&mut rx);

    service.reset().await;
    let snapshot = service.snapshot().await;
    assert!(snapshot.running);
    assert!(snapshot.positions.is_empty());
    assert!(snapshot.recent_alerts.is_empty());

    // Polling carries on with the history it had
    let cycle = snapshot.cycle;
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(service.snapshot().await.cycle > cycle);
    assert!(service.snapshot().await.tracked_instruments >= 1);

    service.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failing_quotes_reported_in_headline() {
    let sink = Arc::new(BroadcastSink::default());
    let service = RadarService::from_source(Config::default(), BrokenQuotes { hang: false }, sink);
    service.start(Config::default()).await.unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;
    let snapshot = service.snapshot().await;
    match &snapshot.feed {
        FeedStatus::Unavailable {
            consecutive_failures,
            reason,
        } => {
            assert!(*consecutive_failures >= 2);
            assert!(reason.contains("502"));
        }
        other => panic!("expected unavailable feed, got {:?}", other),
    }
    assert!(snapshot.headline().starts_with("feed unavailable"));
    // Cycles keep running on existing data
    assert!(snapshot.cycle >= 2);

    service.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_hanging_quotes_time_out() {
    let sink = Arc::new(BroadcastSink::default());
    let service = RadarService::from_source(Config::default(), BrokenQuotes { hang: true }, sink);
    service.start(Config::default()).await.unwrap();

    tokio::time::sleep(Duration::from_secs(7)).await;
    let snapshot = service.snapshot().await;
    match &snapshot.feed {
        FeedStatus::Unavailable { reason, .. } => assert!(reason.contains("timed out")),
        other => panic!("expected unavailable feed, got {:?}", other),
    }

    // Stopping interrupts the hanging fetch
    service.stop().await.unwrap();
    assert!(!service.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn test_no_universe_fails_start() {
    let sink = Arc::new(BroadcastSink::default());
    let service = RadarService::from_source(Config::default(), NoUniverse, sink);

    let result = service.start(Config::default()).await;
    assert!(matches!(result, Err(RadarError::DataUnavailable(_))));
    assert!(!service.is_running().await);
    assert!(service.snapshot().await.headline().contains("feed unavailable"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_universe_marks_feed_degraded() {
    let mut config = Config::default();
    config.radar.universe_refresh_secs = 10;
    let source = ScriptedSource {
        universe_fails_after_first: true,
        ..ScriptedSource::default()
    };
    let (service, _rx) = scripted_service(source, &config);
    service.start(config).await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(service.snapshot().await.feed, FeedStatus::Live);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let snapshot = service.snapshot().await;
    match &snapshot.feed {
        FeedStatus::Degraded { reason } => assert!(reason.contains("reusing last universe")),
        other => panic!("expected degraded feed, got {:?}", other),
    }
    assert!(snapshot.headline().contains("[degraded:"));

    service.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_fallback_quotes_keep_real_history_and_position() {
    let config = Config::default();
    // Primary quotes stop after the climb has ended and an entry was taken
    let primary = ScriptedSource {
        quotes_fail_from: Some(125),
        ..ScriptedSource::default()
    };
    let source = FallbackSource::new(primary, SyntheticSource::new(Some(1)), Duration::from_secs(3));
    let sink = Arc::new(BroadcastSink::default());
    let mut rx = sink.subscribe();
    let service = RadarService::from_source(config.clone(), source, sink);
    service.start(config).await.unwrap();

    tokio::time::sleep(Duration::from_secs(186)).await;
    let before = service.snapshot().await;
    assert_eq!(before.feed, FeedStatus::Live);
    assert_eq!(before.positions.len(), 1);
    let position = before.positions[0].clone();
    assert_eq!(position.last_price, 10_100.0);
    drain(&mut rx);

    // Several polls answered by the synthetic fallback
    tokio::time::sleep(Duration::from_secs(9)).await;
    let after = service.snapshot().await;
    assert!(matches!(after.feed, FeedStatus::Degraded { .. }));

    assert_eq!(after.positions.len(), 1);
    let tracked = &after.positions[0];
    assert_eq!(tracked.entry_price, position.entry_price);
    assert_eq!(tracked.last_price, 10_100.0);
    assert_eq!(tracked.peak_price, position.peak_price);

    for candidate in after.candidates.iter().filter(|c| c.code == CODE) {
        assert_eq!(candidate.price, 10_100.0);
        assert!(candidate.mom15.abs() < 1e-9);
    }
    assert!(drain(&mut rx)
        .iter()
        .all(|a| a.kind != AlertKind::Target && a.kind != AlertKind::Entry));

    service.stop().await.unwrap();
}
