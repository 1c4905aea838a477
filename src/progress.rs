//! Progress and log reporting shared by every operation.
//!
//! Operations never talk to a front end directly. They receive a
//! [`Reporter`] and push [`ProgressEvent`]s through it; whoever started the
//! operation decides how to render them (progress bar, log pane, nothing).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A single update emitted by a running operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// One human-readable status line.
    Log { message: String },
    /// Completion fraction of the current operation, in `[0.0, 1.0]`.
    Progress { fraction: f64 },
    /// Completion cannot be measured (external extraction tool running).
    Indeterminate,
}

/// Callback receiving progress events. Called from the worker thread.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Handle passed into operations for emitting log lines and progress.
///
/// Fractions are clamped to `[0, 1]` and never move backwards within one
/// operation. Call [`Reporter::begin`] to start a new operation from 0.
#[derive(Clone, Default)]
pub struct Reporter {
    callback: Option<ProgressCallback>,
    // f64 bits of the last emitted fraction
    last: Arc<AtomicU64>,
}

impl Reporter {
    /// Create a reporter forwarding to `callback`.
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            last: Arc::new(AtomicU64::new(0f64.to_bits())),
        }
    }

    /// A reporter that drops everything (log lines still reach `tracing`).
    pub fn silent() -> Self {
        Self::default()
    }

    /// Reset progress for a new operation and emit 0.
    pub fn begin(&self) {
        self.last.store(0f64.to_bits(), Ordering::SeqCst);
        self.emit(ProgressEvent::Progress { fraction: 0.0 });
    }

    /// Append a log line.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.emit(ProgressEvent::Log { message });
    }

    /// Set the completion fraction.
    pub fn progress(&self, fraction: f64) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let previous = f64::from_bits(self.last.load(Ordering::SeqCst));
        let fraction = fraction.max(previous);
        self.last.store(fraction.to_bits(), Ordering::SeqCst);
        self.emit(ProgressEvent::Progress { fraction });
    }

    /// Switch the front end to an unbounded (spinner) indicator.
    pub fn indeterminate(&self) {
        self.emit(ProgressEvent::Indeterminate);
    }

    /// Last fraction passed to [`Reporter::progress`].
    pub fn current(&self) -> f64 {
        f64::from_bits(self.last.load(Ordering::SeqCst))
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("has_callback", &self.callback.is_some())
            .field("current", &self.current())
            .finish()
    }
}

/// Collects events in memory. Used by tests and by callers that want the
/// log after the fact.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<std::sync::Mutex<Vec<ProgressEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that appends into this log.
    pub fn reporter(&self) -> Reporter {
        let events = Arc::clone(&self.events);
        Reporter::new(Arc::new(move |event| {
            if let Ok(mut events) = events.lock() {
                events.push(event);
            }
        }))
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Only the log lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Log { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Only the progress fractions, in order.
    pub fn fractions(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { fraction } => Some(fraction),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_clamped_and_monotonic() {
        let log = EventLog::new();
        let reporter = log.reporter();

        reporter.begin();
        reporter.progress(0.5);
        reporter.progress(0.25);
        reporter.progress(2.0);

        assert_eq!(log.fractions(), vec![0.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_begin_resets() {
        let log = EventLog::new();
        let reporter = log.reporter();

        reporter.progress(0.75);
        reporter.begin();
        reporter.progress(0.1);

        assert_eq!(log.fractions(), vec![0.75, 0.0, 0.1]);
        assert_eq!(reporter.current(), 0.1);
    }

    #[test]
    fn test_lines_keep_order() {
        let log = EventLog::new();
        let reporter = log.reporter();

        reporter.log("first");
        reporter.indeterminate();
        reporter.log("second");

        assert_eq!(log.lines(), vec!["first", "second"]);
        assert!(log.events().contains(&ProgressEvent::Indeterminate));
    }

    #[test]
    fn test_silent_reporter_tracks_progress() {
        let reporter = Reporter::silent();
        reporter.progress(0.4);
        assert_eq!(reporter.current(), 0.4);
    }
}
