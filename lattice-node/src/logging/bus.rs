//! Broadcast bus for log records
//!
//! Thin wrapper over [`tokio::sync::broadcast`]:
//! - publishing never blocks and never fails, even with no subscribers;
//! - every subscriber has its own cursor and sees every record sent after
//!   it subscribed;
//! - a slow subscriber observes `Lagged(n)` and skips the `n` oldest records
//!   without affecting anyone else.
//!
//! Trace records are numbered when they are emitted, not when a subscriber
//! sees them, so the per-job trace count survives lag and reset races.

use lattice_core::domain::log::{LogLevel, LogRecord};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Process-wide log stream
#[derive(Clone, Debug)]
pub struct LogBus {
    tx: broadcast::Sender<LogRecord>,
    progress: TraceProgress,
}

impl LogBus {
    /// Creates a bus with the given ring-buffer capacity (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            progress: TraceProgress::default(),
        }
    }

    /// Publishes a record to all current subscribers
    pub fn publish(&self, record: LogRecord) {
        let _ = self.tx.send(record);
    }

    /// Creates an independent receiver for records sent from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogRecord> {
        self.tx.subscribe()
    }

    /// Creates a logger that tags its records with `source`
    pub fn logger(&self, source: impl Into<String>) -> Logger {
        Logger {
            bus: self.clone(),
            source: Arc::from(source.into()),
        }
    }
}

/// Counter of trace records emitted since the current job started
#[derive(Clone, Debug, Default)]
struct TraceProgress(Arc<AtomicU64>);

impl TraceProgress {
    /// Increments the counter and returns the new value
    fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn reset(&self) {
        self.0.store(0, Ordering::Release);
    }

    fn count(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Cheap, cloneable handle for emitting records from one component
#[derive(Clone, Debug)]
pub struct Logger {
    bus: LogBus,
    source: Arc<str>,
}

impl Logger {
    /// Returns a logger on the same bus with a different source tag
    pub fn scoped(&self, source: impl Into<String>) -> Logger {
        self.bus.logger(source)
    }

    pub fn emit(&self, level: LogLevel, message: impl Into<String>, data: Option<Value>) {
        let mut record = LogRecord::new(level, self.source.as_ref(), message);
        record.data = data;
        if level == LogLevel::Trace {
            record.trace_seq = Some(self.bus.progress.increment());
        }
        self.bus.publish(record);
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.emit(LogLevel::Trace, message, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message, None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warn, message, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message, None);
    }

    pub fn warn_with(&self, message: impl Into<String>, data: Value) {
        self.emit(LogLevel::Warn, message, Some(data));
    }

    pub fn error_with(&self, message: impl Into<String>, data: Value) {
        self.emit(LogLevel::Error, message, Some(data));
    }

    /// Restarts the trace progress count; called at the start of every job
    pub fn reset_progress(&self) {
        self.bus.progress.reset();
    }

    /// Trace records emitted since the last reset
    pub fn trace_count(&self) -> u64 {
        self.bus.progress.count()
    }
}
