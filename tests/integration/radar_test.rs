//! Integration tests for the radar pipeline
//!
//! Drives the synchronous core with a simulated 1.5s poll clock.

use chrono::{DateTime, Duration, Utc};
use quote_radar::alert::{Alert, AlertKind};
use quote_radar::config::Config;
use quote_radar::lifecycle::LifecycleState;
use quote_radar::radar::{CycleReport, FeedStatus, Radar};
use quote_radar::source::{InstrumentMeta, Quote};

const POLL_MS: i64 = 1_500;
const CODE: &str = "123456";

struct Sim {
    radar: Radar,
    now: DateTime<Utc>,
}

impl Sim {
    fn new(config: &Config) -> Self {
        let mut radar = Radar::new(config);
        radar.register_instruments(&[InstrumentMeta {
            code: CODE.to_string(),
            name: "Radar Test Co".to_string(),
        }]);
        Self {
            radar,
            now: Utc::now(),
        }
    }

    /// One poll: ingest, cycle, then resolve due confirmations
    fn step(&mut self, price: f64) -> (CycleReport, Vec<Alert>) {
        let quote = Quote {
            code: CODE.to_string(),
            price,
            daily_change_pct: 1.5,
        };
        self.radar.ingest(&[quote], self.now);
        let report = self.radar.run_cycle(self.now);
        let entries = self.radar.confirm_due(self.now);
        self.now += Duration::milliseconds(POLL_MS);
        (report, entries)
    }

    /// 120s flat at 10000
    fn flat(&mut self) {
        for _ in 0..80 {
            let (report, entries) = self.step(10_000.0);
            assert!(report.scheduled.is_empty());
            assert!(entries.is_empty());
        }
    }
}

/// 1% rise over 60s, in 40 even steps
fn rising_prices() -> impl Iterator<Item = f64> {
    (1..=40).map(|i| 10_000.0 + 2.5 * i as f64)
}

#[test]
fn test_entry_lands_within_delay_plus_one_poll() {
    let config = Config::default();
    let mut sim = Sim::new(&config);
    sim.flat();

    let mut scheduled_at = None;
    let mut entry = None;
    for price in rising_prices() {
        let at = sim.now;
        let (report, entries) = sim.step(price);
        if scheduled_at.is_none() && !report.scheduled.is_empty() {
            scheduled_at = Some(at);
        }
        if let Some(alert) = entries.into_iter().next() {
            entry = Some((at, alert));
            break;
        }
    }

    let scheduled_at = scheduled_at.expect("rise should be scheduled");
    let (entered_at, alert) = entry.expect("rise should be confirmed");
    let bound = config.lifecycle.confirm_delay() + Duration::milliseconds(POLL_MS);
    assert!(entered_at - scheduled_at <= bound);
    assert!(entered_at - scheduled_at >= config.lifecycle.confirm_delay());

    assert_eq!(alert.kind, AlertKind::Entry);
    assert_eq!(alert.code, CODE);
    assert!(alert.title.contains("Radar Test Co"));
    assert_eq!(sim.radar.lifecycle().state(CODE), LifecycleState::Entry);
    assert_eq!(sim.radar.positions().get(CODE).unwrap().entry_price, alert.price);
}

#[test]
fn test_no_rescheduling_while_position_open() {
    let mut sim = Sim::new(&Config::default());
    sim.flat();

    let mut entries = 0;
    let mut scheduled = 0;
    for price in rising_prices() {
        let (report, alerts) = sim.step(price);
        scheduled += report.scheduled.len();
        entries += alerts.len();
    }

    assert_eq!(scheduled, 1);
    assert_eq!(entries, 1);
}

#[test]
fn test_reset_round_trip() {
    let mut sim = Sim::new(&Config::default());
    sim.flat();

    let mut prices = rising_prices();
    for price in prices.by_ref() {
        let (_, entries) = sim.step(price);
        if !entries.is_empty() {
            break;
        }
    }
    assert_eq!(sim.radar.positions().len(), 1);

    sim.radar.reset();
    let snapshot = sim.radar.snapshot(true, FeedStatus::Live);
    assert!(snapshot.positions.is_empty());
    assert!(snapshot.recent_alerts.is_empty());
    assert!(snapshot.candidates.is_empty());
    assert_eq!(snapshot.tracked_instruments, 1);

    // History survived, so the still-rising instrument is scheduled again
    // straight away: the reset dropped its cooldown too
    let price = prices.next().unwrap();
    let (report, _) = sim.step(price);
    assert_eq!(report.scheduled.len(), 1);
    assert_eq!(sim.radar.lifecycle().state(CODE), LifecycleState::Confirm);
}

#[test]
fn test_exit_keeps_tracking_the_position() {
    let mut sim = Sim::new(&Config::default());
    sim.flat();

    let mut entry_price = None;
    for price in rising_prices() {
        let (_, entries) = sim.step(price);
        if let Some(alert) = entries.first() {
            entry_price = Some(alert.price);
            break;
        }
    }
    let entry_price = entry_price.unwrap();

    // A sharp drop turns the 15s momentum negative
    let (report, _) = sim.step(entry_price * 0.99);
    let exits: Vec<&Alert> = report
        .alerts
        .iter()
        .filter(|a| a.kind == AlertKind::Exit)
        .collect();
    assert_eq!(exits.len(), 1);
    assert!(exits[0].body.contains("momentum fading"));

    assert_eq!(sim.radar.lifecycle().state(CODE), LifecycleState::Exit);
    assert_eq!(sim.radar.positions().len(), 1);

    // Debounced on the next poll
    let (report, _) = sim.step(entry_price * 0.98);
    assert!(report.alerts.iter().all(|a| a.kind != AlertKind::Exit));
    assert_eq!(sim.radar.positions().len(), 1);

    let snapshot = sim.radar.snapshot(true, FeedStatus::Live);
    assert_eq!(snapshot.positions.len(), 1);
    assert!(snapshot.positions[0].return_pct < 0.0);
    assert_eq!(snapshot.positions[0].state, LifecycleState::Exit);
}

#[test]
fn test_cleared_position_respects_cooldown() {
    let config = Config::default();
    let mut sim = Sim::new(&config);
    sim.flat();

    let mut prices = rising_prices();
    for price in prices.by_ref() {
        let (_, entries) = sim.step(price);
        if !entries.is_empty() {
            break;
        }
    }
    assert!(sim.radar.clear_position(CODE));

    for price in prices {
        let (report, _) = sim.step(price);
        assert!(report.scheduled.is_empty());
    }
    assert_eq!(sim.radar.lifecycle().state(CODE), LifecycleState::Ready);
}

#[test]
fn test_warm_up_reports_unscoreable() {
    let mut sim = Sim::new(&Config::default());
    let (report, _) = sim.step(10_000.0);

    assert_eq!(report.scored, 0);
    assert_eq!(report.unscoreable, 1);
    let snapshot = sim.radar.snapshot(true, FeedStatus::Live);
    assert_eq!(snapshot.scoreable_instruments, 0);
    assert!(snapshot.headline().contains("warming up"));
}
