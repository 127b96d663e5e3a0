use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::level::LogLevel;

/// A single formatted message raised by a `Logger`.
///
/// One event is built per `Logger::log` call and shared by reference with
/// every subscribed target, so the message is formatted exactly once.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// Category of the logger that raised the event
    pub category: Arc<str>,
    /// Severity the message was logged at
    pub level: LogLevel,
    /// The fully formatted message
    pub message: String,
    /// Local wall-clock time the event was raised
    pub timestamp: DateTime<Local>,
}

impl LogEvent {
    pub fn new(category: Arc<str>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            category,
            level,
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    /// Replaces the timestamp, mostly useful for deterministic rendering.
    pub fn at(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
