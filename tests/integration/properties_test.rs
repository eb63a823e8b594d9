//! Property tests for ranking, history and exit bookkeeping

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use quote_radar::position::{ExitEngine, Position};
use quote_radar::signal::{top_k, ScoreResult, SignalScorer};
use quote_radar::source::pad_code;
use quote_radar::tick::{Tick, TickStore, RETENTION_SECS};
use quote_radar::window::WindowStat;

fn scored(code: String, score: f64, price: f64) -> ScoreResult {
    ScoreResult {
        code,
        price,
        daily_change_pct: 0.0,
        mom15: 0.0,
        mom60: 0.5,
        has_short_window: true,
        has_long_window: true,
        flow_ratio: 1.5,
        turnover60: 0.0,
        heat: 0.0,
        score,
        scored_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    }
}

proptest! {
    /// Top-K is bounded, ordered by score descending and by code on ties
    #[test]
    fn top_k_is_bounded_and_ordered(
        entries in prop::collection::vec(("[0-9]{6}", -5i32..5), 0..30),
        k in 1usize..10,
    ) {
        let scores = entries
            .into_iter()
            .map(|(code, score)| scored(code, score as f64, 1_000.0));
        let top = top_k(scores, k);

        prop_assert!(top.len() <= k);
        for pair in top.windows(2) {
            prop_assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].code <= pair[1].code)
            );
        }
    }

    /// History stays ordered and inside the retention window
    #[test]
    fn tick_history_is_ordered_and_pruned(
        steps in prop::collection::vec((0i64..5_000, 1.0f64..100_000.0), 1..300),
    ) {
        let mut store = TickStore::new();
        let mut now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        for (gap_ms, price) in steps {
            now += Duration::milliseconds(gap_ms);
            store.record("A", price, 0.0, now);
        }

        let ticks: Vec<_> = store.ticks_since("A", Duration::seconds(RETENTION_SECS * 2), now).collect();
        prop_assert_eq!(ticks.len(), store.len("A"));
        for pair in ticks.windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        for tick in &ticks {
            prop_assert!(now - tick.timestamp <= Duration::seconds(RETENTION_SECS));
            prop_assert!(tick.turnover_estimate >= 0.0);
        }
    }

    /// A window query never reaches further back than its length
    #[test]
    fn ticks_since_respects_window(
        gaps in prop::collection::vec(0i64..3_000, 1..200),
        window_secs in 1i64..240,
    ) {
        let mut store = TickStore::new();
        let mut now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        for (i, gap_ms) in gaps.into_iter().enumerate() {
            now += Duration::milliseconds(gap_ms);
            store.record("A", 1_000.0 + i as f64, 0.0, now);
        }

        let window = Duration::seconds(window_secs);
        for tick in store.ticks_since("A", window, now) {
            prop_assert!(tick.timestamp >= now - window);
        }
    }

    /// One sample is never read as a flat window
    #[test]
    fn single_sample_is_unscoreable(price in 0.01f64..1_000_000.0) {
        let tick = Tick::new(Utc::now(), price, None, 0.0);
        prop_assert!(WindowStat::from_ticks([&tick]).is_none());
    }

    /// Finite inputs always give a finite score and a non-negative heat
    #[test]
    fn composite_is_finite(
        mom15 in -50.0f64..50.0,
        mom60 in -50.0f64..50.0,
        flow in 0.0f64..1_000.0,
        daily in -30.0f64..30.0,
    ) {
        let (score, heat) = SignalScorer::default().composite(mom15, mom60, flow, daily);
        prop_assert!(score.is_finite());
        prop_assert!(heat >= 0.0);
    }

    /// The peak never falls and reached targets stay reached
    #[test]
    fn position_peak_and_targets_latch(
        prices in prop::collection::vec(5_000.0f64..15_000.0, 1..100),
    ) {
        let engine = ExitEngine::default();
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut position = Position::new("A", 10_000.0, start);
        let mut peak = position.peak_price;
        let mut first = false;
        let mut second = false;

        for (i, price) in prices.into_iter().enumerate() {
            let now = start + Duration::seconds(i as i64);
            engine.evaluate(&mut position, &scored("A".to_string(), 1.0, price), now);

            prop_assert!(position.peak_price >= peak);
            prop_assert!(position.peak_price >= price);
            prop_assert!(!first || position.hit_first_target);
            prop_assert!(!second || position.hit_second_target);
            peak = position.peak_price;
            first = position.hit_first_target;
            second = position.hit_second_target;
        }
    }

    /// Padded codes are always six digits
    #[test]
    fn pad_code_is_six_digits(raw in "[0-9]{1,6}") {
        match pad_code(&raw) {
            Some(code) => {
                prop_assert_eq!(code.len(), 6);
                prop_assert!(code.ends_with(raw.trim_start_matches('0')));
            }
            None => prop_assert!(raw.chars().all(|c| c == '0')),
        }
    }
}
