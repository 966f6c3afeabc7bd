use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// An observability trace entry (§3 `LogEntry`).
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub component: String,
    pub message: String,
}

/// Bounded, thread-safe ring buffer backing the `Logs(limit)` control
/// operation (§6). Oldest entries are evicted once `capacity` is reached.
#[derive(Clone)]
pub struct LogRing {
    inner: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogRing {
    pub fn new(capacity: usize) -> Self {
        LogRing {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn push(&self, entry: LogEntry) {
        let mut buf = self.inner.lock().unwrap();
        if buf.len() >= self.capacity {
            buf.pop_front();
        }
        buf.push_back(entry);
    }

    /// Most-recent `limit` entries, newest last.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        let buf = self.inner.lock().unwrap();
        let skip = buf.len().saturating_sub(limit);
        buf.iter().skip(skip).cloned().collect()
    }
}

/// A `tracing_subscriber::Layer` that mirrors every event into a [`LogRing`].
/// This supplements (never replaces) the process's normal `fmt` subscriber.
#[derive(Clone)]
pub struct LogRingLayer {
    ring: LogRing,
}

impl LogRingLayer {
    pub fn new(ring: LogRing) -> Self {
        LogRingLayer { ring }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for LogRingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let level = match *event.metadata().level() {
            Level::ERROR => "error",
            Level::WARN => "warn",
            Level::INFO => "info",
            Level::DEBUG => "debug",
            Level::TRACE => "trace",
        };
        self.ring.push(LogEntry {
            timestamp: Utc::now(),
            level: level.to_string(),
            component: event.metadata().target().to_string(),
            message: visitor.message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_evicts_oldest_past_capacity() {
        let ring = LogRing::new(2);
        ring.push(LogEntry {
            timestamp: Utc::now(),
            level: "info".into(),
            component: "a".into(),
            message: "one".into(),
        });
        ring.push(LogEntry {
            timestamp: Utc::now(),
            level: "info".into(),
            component: "a".into(),
            message: "two".into(),
        });
        ring.push(LogEntry {
            timestamp: Utc::now(),
            level: "info".into(),
            component: "a".into(),
            message: "three".into(),
        });
        let recent = ring.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "two");
        assert_eq!(recent[1].message, "three");
    }

    #[test]
    fn recent_limit_is_respected() {
        let ring = LogRing::new(10);
        for i in 0..5 {
            ring.push(LogEntry {
                timestamp: Utc::now(),
                level: "info".into(),
                component: "a".into(),
                message: i.to_string(),
            });
        }
        let recent = ring.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "3");
        assert_eq!(recent[1].message, "4");
    }
}
