//! Query log port

use serde_json::Value;

/// A single loggable pipeline event
#[derive(Debug, Clone)]
pub struct QueryEvent {
    /// Event discriminator (e.g. "verdict")
    pub event_type: String,
    /// Structured payload merged into the log line
    pub payload: Value,
}

impl QueryEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Sink for query events
///
/// Implementations must never fail the caller; logging is best-effort.
pub trait QueryLogger: Send + Sync {
    fn log(&self, event: QueryEvent);
}

/// No-op query logger
pub struct NoQueryLog;

impl QueryLogger for NoQueryLog {
    fn log(&self, _event: QueryEvent) {}
}
