use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::LogEvent;
use crate::level::LogLevel;
use crate::target::Target;

/// Raw value of the shared minimum level when no target is registered.
pub(crate) const NO_TARGETS: u8 = u8::MAX;

/// A named source of log events.
///
/// Loggers are only created by a `Registry`, which guarantees there is
/// exactly one logger per category for the registry's lifetime. A logger
/// keeps the list of targets subscribed to it and raises every event to all
/// of them.
///
/// # Examples
///
/// ```
/// # use category_logger::{Registry, LogLevel, ConsoleTarget, log_info};
/// # use std::sync::Arc;
/// let registry = Registry::new();
/// registry.add_target(Arc::new(ConsoleTarget::console()));
///
/// let log = registry.get_logger("app.Startup");
/// log_info!(log, "listening on port {}", 8080);
/// log.warn(format_args!("disk at {}%", 91));
/// ```
pub struct Logger {
    category: Arc<str>,
    targets: RwLock<Vec<Arc<dyn Target>>>,
    min_level: Arc<AtomicU8>,
}

impl Logger {
    pub(crate) fn new(category: &str, min_level: Arc<AtomicU8>) -> Self {
        Self {
            category: Arc::from(category),
            targets: RwLock::new(Vec::new()),
            min_level,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// True if at least one registered target could accept `level`.
    ///
    /// This checks the registry-wide minimum, not this logger's own
    /// subscribers, so a `true` here may still result in no output.
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        let min = self.min_level.load(Ordering::Acquire);
        min != NO_TARGETS && level.as_u8() >= min
    }

    /// Formats the message and raises it to every subscribed target.
    ///
    /// The message is only formatted when some target could accept the
    /// level. Targets are snapshotted before dispatch so a target may log
    /// or reconfigure the registry from inside its handler.
    pub fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.is_enabled(level) {
            return;
        }

        let targets = self.targets.read().clone();
        if targets.is_empty() {
            return;
        }

        let event = LogEvent::new(self.category.clone(), level, fmt::format(args));
        for target in &targets {
            target.handle(&event);
        }
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }

    pub fn fatal(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Fatal, args);
    }

    pub fn subscriber_count(&self) -> usize {
        self.targets.read().len()
    }

    pub fn is_subscribed(&self, target: &Arc<dyn Target>) -> bool {
        self.targets.read().iter().any(|t| Arc::ptr_eq(t, target))
    }

    /// Returns false if the target was already subscribed.
    pub(crate) fn subscribe(&self, target: &Arc<dyn Target>) -> bool {
        let mut targets = self.targets.write();
        if targets.iter().any(|t| Arc::ptr_eq(t, target)) {
            return false;
        }
        targets.push(target.clone());
        target.settings().subscribed();
        true
    }

    pub(crate) fn unsubscribe(&self, target: &Arc<dyn Target>) -> bool {
        let mut targets = self.targets.write();
        let before = targets.len();
        targets.retain(|t| !Arc::ptr_eq(t, target));
        let removed = targets.len() != before;
        if removed {
            target.settings().unsubscribed();
        }
        removed
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("category", &self.category)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Logs a formatted message at the given level.
///
/// ```
/// # use category_logger::{Registry, LogLevel, log_at};
/// let registry = Registry::new();
/// let log = registry.get_logger("demo");
/// log_at!(log, LogLevel::Error, "failed after {} attempts", 3);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format_args!($($arg)+))
    };
}

/// Logs a formatted message at `Debug`.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Logs a formatted message at `Info`.
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Logs a formatted message at `Warn`.
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Logs a formatted message at `Error`.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Logs a formatted message at `Fatal`.
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
