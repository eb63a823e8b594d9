//! Notification sinks

use super::{Alert, AlertKind};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Delivery target for alerts
///
/// Fire-and-forget: the core never waits for or inspects an acknowledgment.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, alert: &Alert);
}

/// Writes alerts to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn emit(&self, alert: &Alert) {
        match alert.kind {
            AlertKind::Exit => tracing::warn!(
                kind = %alert.kind,
                code = %alert.code,
                body = %alert.body,
                "{}",
                alert.title
            ),
            _ => tracing::info!(
                kind = %alert.kind,
                code = %alert.code,
                body = %alert.body,
                "{}",
                alert.title
            ),
        }
    }
}

/// Fans alerts out to any number of subscribers
pub struct BroadcastSink {
    tx: broadcast::Sender<Alert>,
}

impl BroadcastSink {
    /// Create a sink buffering up to `capacity` alerts per lagging receiver
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future alerts
    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for BroadcastSink {
    fn emit(&self, alert: &Alert) {
        // No receivers is fine
        let _ = self.tx.send(alert.clone());
    }
}

/// Forwards every alert to several sinks
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl NotificationSink for MultiSink {
    fn emit(&self, alert: &Alert) {
        for sink in &self.sinks {
            sink.emit(alert);
        }
    }
}
