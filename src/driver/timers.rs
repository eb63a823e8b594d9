//! Per-instrument confirmation timers

use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinHandle;

/// One deferred task per instrument, all cancellable at once
#[derive(Default)]
pub struct ConfirmTimers {
    handles: HashMap<String, JoinHandle<()>>,
}

impl ConfirmTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the confirmation task for an instrument
    ///
    /// A timer already registered for the same instrument is aborted first.
    pub fn schedule<F>(&mut self, code: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = self.handles.remove(code) {
            previous.abort();
        }
        self.handles.insert(code.to_string(), tokio::spawn(task));
    }

    /// Abort every outstanding timer
    ///
    /// Returns how many were still running.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for (_, handle) in self.handles.drain() {
            if !handle.is_finished() {
                cancelled += 1;
            }
            handle.abort();
        }
        cancelled
    }

    /// Timers that have not fired yet
    pub fn pending(&self) -> usize {
        self.handles.values().filter(|h| !h.is_finished()).count()
    }
}
