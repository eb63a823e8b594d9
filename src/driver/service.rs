//! Radar service: the fixed-interval poll loop and its controls

use super::{ConfirmTimers, RadarClock, RadarError};
use crate::alert::{Alert, NotificationSink};
use crate::config::Config;
use crate::radar::{FeedStatus, Radar, RadarSnapshot};
use crate::source::{with_timeout, DataOrigin, QuoteSource, SourceError, UniverseSource};
use crate::telemetry::{self, FetchKind, GaugeMetric};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Mutable state shared by the loop, the confirmation timers and the host
struct ServiceState {
    config: Config,
    radar: Radar,
    feed: FeedStatus,
    running: bool,
    /// Candidate codes from the latest universe
    universe: Vec<String>,
    /// Set while the universe in use is stale or came from a fallback
    universe_issue: Option<String>,
    last_universe_refresh: Option<Instant>,
    consecutive_failures: u32,
    timers: ConfirmTimers,
}

struct Shared {
    state: RwLock<ServiceState>,
    universe_source: Arc<dyn UniverseSource>,
    quote_source: Arc<dyn QuoteSource>,
    sink: Arc<dyn NotificationSink>,
    clock: RadarClock,
}

struct LoopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns the radar and drives it from a fixed-interval loop
///
/// Each cycle refreshes the universe when due, fetches quotes, feeds the
/// tick store, re-scores and drives the lifecycle. Confirmations run as
/// independent timers so the loop never sleeps on them. Fetch failures are
/// reported through the snapshot and never stop the loop.
pub struct RadarService {
    shared: Arc<Shared>,
    handle: Mutex<Option<LoopHandle>>,
}

impl RadarService {
    pub fn new(
        config: Config,
        universe_source: Arc<dyn UniverseSource>,
        quote_source: Arc<dyn QuoteSource>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let state = ServiceState {
            radar: Radar::new(&config),
            config,
            feed: FeedStatus::Idle,
            running: false,
            universe: Vec::new(),
            universe_issue: None,
            last_universe_refresh: None,
            consecutive_failures: 0,
            timers: ConfirmTimers::new(),
        };

        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(state),
                universe_source,
                quote_source,
                sink,
                clock: RadarClock::new(),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Build a service around one source serving both universe and quotes
    pub fn from_source<S>(config: Config, source: S, sink: Arc<dyn NotificationSink>) -> Self
    where
        S: UniverseSource + QuoteSource + 'static,
    {
        let source = Arc::new(source);
        Self::new(config, source.clone(), source, sink)
    }

    /// Validate `config`, fetch the first universe and start polling
    ///
    /// Fails without starting when the configuration is invalid, or when no
    /// universe can be fetched and none is cached from an earlier run.
    pub async fn start(&self, config: Config) -> Result<(), RadarError> {
        config.validate()?;

        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return Err(RadarError::AlreadyRunning);
        }

        let poll_interval = config.radar.poll_interval();
        {
            let mut state = self.shared.state.write().await;
            state.radar.apply_config(&config);
            state.config = config;
            state.last_universe_refresh = None;
        }

        if let Err(e) = self.shared.refresh_universe().await {
            if self.shared.state.read().await.universe.is_empty() {
                tracing::error!(error = %e, "Cannot start: no universe available");
                return Err(RadarError::DataUnavailable(e));
            }
        }

        self.shared.state.write().await.running = true;

        let (shutdown, rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move { shared.run(poll_interval, rx).await });
        *handle = Some(LoopHandle { shutdown, task });

        tracing::info!(poll_ms = poll_interval.as_millis() as u64, "Radar started");
        Ok(())
    }

    /// Stop polling and cancel every pending confirmation
    ///
    /// When this returns no confirmation timer can fire any more.
    pub async fn stop(&self) -> Result<(), RadarError> {
        let Some(running) = self.handle.lock().await.take() else {
            return Err(RadarError::NotRunning);
        };

        {
            let mut state = self.shared.state.write().await;
            state.running = false;
            let timers = state.timers.cancel_all();
            let pending = state.radar.cancel_pending();
            tracing::info!(timers, pending = pending.len(), "Radar stopping");
        }

        // The loop may already have exited on its own
        let _ = running.shutdown.send(true);
        if let Err(e) = running.task.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "Poll loop ended abnormally");
            }
        }

        tracing::info!("Radar stopped");
        Ok(())
    }

    /// Clear alerts, lifecycle state and positions
    pub async fn reset(&self) {
        let mut state = self.shared.state.write().await;
        let timers = state.timers.cancel_all();
        state.radar.reset();
        tracing::info!(cancelled_timers = timers, "Service reset");
    }

    /// Stop tracking one position
    pub async fn clear_position(&self, code: &str) -> bool {
        self.shared.state.write().await.radar.clear_position(code)
    }

    pub async fn is_running(&self) -> bool {
        self.shared.state.read().await.running
    }

    /// Latest cycle as seen by the host
    pub async fn snapshot(&self) -> RadarSnapshot {
        let state = self.shared.state.read().await;
        state.radar.snapshot(state.running, state.feed.clone())
    }

    /// Configuration in effect
    pub async fn config(&self) -> Config {
        self.shared.state.read().await.config.clone()
    }
}

impl Shared {
    async fn run(self: Arc<Self>, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = interval.tick() => {}
            }
            // Dropping an in-flight cycle cancels its fetch
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = self.poll_once() => {}
            }
        }

        tracing::debug!("Poll loop exited");
    }

    async fn poll_once(self: &Arc<Self>) {
        let started = Instant::now();

        let refresh_due = {
            let state = self.state.read().await;
            if !state.running {
                return;
            }
            let every = state.config.radar.universe_refresh();
            state
                .last_universe_refresh
                .map_or(true, |at| at.elapsed() >= every)
        };
        if refresh_due {
            // Failures are recorded in the feed status
            let _ = self.refresh_universe().await;
        }

        let (market, codes, timeout) = {
            let state = self.state.read().await;
            (
                state.config.radar.market,
                Self::quote_codes(&state),
                Self::request_guard(&state.config),
            )
        };

        let result = if codes.is_empty() {
            None
        } else {
            Some(with_timeout(timeout, self.quote_source.fetch_quotes(market, &codes)).await)
        };
        let now = self.clock.now();

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if !state.running {
            return;
        }

        match result {
            Some(Ok(batch)) => {
                state.consecutive_failures = 0;
                let origin = batch.origin.tick_origin();
                let accepted = state.radar.ingest_from(&batch.quotes, origin, now);
                state.feed = match (batch.origin, &state.universe_issue) {
                    (DataOrigin::Fallback { reason }, _) => FeedStatus::Degraded { reason },
                    (DataOrigin::Primary, Some(issue)) => FeedStatus::Degraded {
                        reason: issue.clone(),
                    },
                    (DataOrigin::Primary, None) => FeedStatus::Live,
                };
                tracing::trace!(requested = codes.len(), accepted, "Quotes ingested");
            }
            Some(Err(e)) => {
                state.consecutive_failures += 1;
                telemetry::record_fetch_failure(FetchKind::Quotes);
                tracing::warn!(
                    error = %e,
                    failures = state.consecutive_failures,
                    "Quote fetch failed, scoring on existing data"
                );
                state.feed = FeedStatus::Unavailable {
                    reason: e.to_string(),
                    consecutive_failures: state.consecutive_failures,
                };
            }
            None => {}
        }

        let report = state.radar.run_cycle(now);
        for (code, deadline) in report.scheduled.iter().cloned() {
            self.schedule_confirmation(&mut state.timers, code, deadline, now);
        }
        for alert in &report.alerts {
            self.emit(alert);
        }

        telemetry::set_gauge(
            GaugeMetric::TrackedInstruments,
            state.radar.ticks().instrument_count() as f64,
        );
        telemetry::set_gauge(GaugeMetric::ScoreableInstruments, report.scored as f64);
        telemetry::set_gauge(GaugeMetric::OpenPositions, state.radar.positions().len() as f64);
        telemetry::set_gauge(GaugeMetric::PendingConfirmations, state.timers.pending() as f64);

        tracing::debug!(
            cycle = state.radar.cycle(),
            scored = report.scored,
            warming_up = report.unscoreable,
            scheduled = report.scheduled.len(),
            alerts = report.alerts.len(),
            "Cycle complete"
        );
        drop(guard);

        telemetry::record_cycle(started.elapsed());
    }

    /// Re-rank the universe; on failure keep the cached one if there is one
    async fn refresh_universe(&self) -> Result<(), SourceError> {
        let (market, top_n, watch_count, timeout) = {
            let state = self.state.read().await;
            let radar = &state.config.radar;
            (
                radar.market,
                radar.top_n,
                radar.watch_count,
                Self::request_guard(&state.config),
            )
        };

        let result = with_timeout(
            timeout,
            self.universe_source.rank_candidates(market, top_n, watch_count),
        )
        .await;
        let now = self.clock.now();

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        match result {
            Ok(universe) => {
                state.radar.register_instruments(&universe.metadata);
                state
                    .radar
                    .ingest_from(&universe.initial_quotes, universe.origin.tick_origin(), now);
                state.universe_issue = match universe.origin {
                    DataOrigin::Fallback { reason } => Some(reason),
                    DataOrigin::Primary => None,
                };
                state.universe = universe.candidate_codes;
                state.last_universe_refresh = Some(Instant::now());

                telemetry::set_gauge(GaugeMetric::UniverseSize, state.universe.len() as f64);
                tracing::info!(
                    market = %market,
                    candidates = state.universe.len(),
                    "Universe refreshed"
                );
                Ok(())
            }
            Err(e) => {
                telemetry::record_fetch_failure(FetchKind::Universe);
                if state.universe.is_empty() {
                    state.consecutive_failures += 1;
                    state.feed = FeedStatus::Unavailable {
                        reason: e.to_string(),
                        consecutive_failures: state.consecutive_failures,
                    };
                    tracing::warn!(error = %e, "Universe fetch failed, nothing cached");
                } else {
                    state.universe_issue = Some(format!("reusing last universe: {}", e));
                    state.last_universe_refresh = Some(Instant::now());
                    tracing::warn!(error = %e, "Universe refresh failed, reusing last universe");
                }
                Err(e)
            }
        }
    }

    /// Outer bound on one source call; leaves room for a fallback attempt
    /// after the primary used up its own timeout
    fn request_guard(config: &Config) -> Duration {
        config.radar.fetch_timeout() * 2
    }

    /// Codes to poll: tracked positions first, then the universe
    fn quote_codes(state: &ServiceState) -> Vec<String> {
        let mut seen = HashSet::new();
        state
            .radar
            .position_codes()
            .into_iter()
            .chain(state.universe.iter().cloned())
            .filter(|code| seen.insert(code.clone()))
            .take(state.config.radar.max_quote_batch)
            .collect()
    }

    fn schedule_confirmation(
        self: &Arc<Self>,
        timers: &mut ConfirmTimers,
        code: String,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        let delay = (deadline - now).to_std().unwrap_or_default();
        let shared = Arc::clone(self);
        let key = code.clone();

        timers.schedule(&key, async move {
            tokio::time::sleep(delay).await;
            shared.fire_confirmation(&code).await;
        });
    }

    async fn fire_confirmation(&self, code: &str) {
        let mut state = self.state.write().await;
        if !state.running {
            return;
        }
        let now = self.clock.now();
        if let Some(alert) = state.radar.confirm(code, now) {
            self.emit(&alert);
        }
    }

    fn emit(&self, alert: &Alert) {
        telemetry::record_alert(alert.kind);
        self.sink.emit(alert);
    }
}
