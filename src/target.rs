use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::error::Result;
use crate::event::LogEvent;
use crate::filter::{self, CategoryFilter};
use crate::level::LogLevel;

/// A destination for log events.
///
/// Targets are registered with a `Registry`, which subscribes them to every
/// logger whose category matches one of the target's filters. Loggers then
/// call `handle` for each event; the provided implementation drops events
/// below the target's level and forwards the rest to `on_event`.
///
/// Implementations are shared between threads behind an `Arc`, so any state
/// `on_event` mutates needs interior mutability.
///
/// # Usage
///
/// ```
/// # use category_logger::{LogEvent, Target, TargetSettings};
/// # use parking_lot::Mutex;
/// // Target that only counts what it receives
/// #[derive(Default)]
/// struct Counter {
///     settings: TargetSettings,
///     seen: Mutex<usize>,
/// }
///
/// impl Target for Counter {
///     fn settings(&self) -> &TargetSettings {
///         &self.settings
///     }
///
///     fn on_event(&self, _event: &LogEvent) {
///         *self.seen.lock() += 1;
///     }
/// }
/// ```
pub trait Target: Send + Sync {
    /// Level and filter configuration of this target.
    fn settings(&self) -> &TargetSettings;

    /// Renders and writes an event that already passed the level gate.
    fn on_event(&self, event: &LogEvent);

    /// Entry point used by loggers.
    fn handle(&self, event: &LogEvent) {
        if event.level >= self.settings().level() {
            self.on_event(event);
        }
    }
}

/// Level, filters and subscription bookkeeping shared by every target.
///
/// Changing the level or filters of a target that is already registered
/// must go through `Registry::set_target_level` / `set_target_filters` so
/// subscriptions and the registry-wide minimum follow the change.
#[derive(Debug)]
pub struct TargetSettings {
    level: AtomicU8,
    filters: RwLock<Vec<CategoryFilter>>,
    subscriptions: AtomicUsize,
}

impl TargetSettings {
    pub fn new(level: LogLevel, filters: Vec<CategoryFilter>) -> Self {
        let settings = Self {
            level: AtomicU8::new(level.as_u8()),
            filters: RwLock::new(Vec::new()),
            subscriptions: AtomicUsize::new(0),
        };
        settings.replace_filters(filters);
        settings
    }

    /// Parses each pattern with `CategoryFilter::parse`.
    pub fn with_patterns<S: AsRef<str>>(level: LogLevel, patterns: &[S]) -> Result<Self> {
        let filters = patterns
            .iter()
            .map(|pattern| CategoryFilter::parse(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(level, filters))
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn filters(&self) -> Vec<CategoryFilter> {
        self.filters.read().clone()
    }

    pub fn matches(&self, category: &str) -> bool {
        filter::matches_any(&self.filters.read(), category)
    }

    /// Number of loggers this target is currently subscribed to.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::Acquire)
    }

    pub(crate) fn replace_level(&self, level: LogLevel) {
        self.level.store(level.as_u8(), Ordering::Release);
    }

    // An empty list falls back to "*".
    pub(crate) fn replace_filters(&self, filters: Vec<CategoryFilter>) {
        let filters = if filters.is_empty() {
            vec![CategoryFilter::Any]
        } else {
            filters
        };
        *self.filters.write() = filters;
    }

    pub(crate) fn subscribed(&self) {
        self.subscriptions.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn unsubscribed(&self) {
        let _ = self
            .subscriptions
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self::new(LogLevel::All, vec![CategoryFilter::Any])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Recorder {
        settings: TargetSettings,
        seen: parking_lot::Mutex<Vec<LogLevel>>,
    }

    impl Target for Recorder {
        fn settings(&self) -> &TargetSettings {
            &self.settings
        }

        fn on_event(&self, event: &LogEvent) {
            self.seen.lock().push(event.level);
        }
    }

    #[test]
    fn test_handle_gates_by_level() {
        let recorder = Recorder {
            settings: TargetSettings::new(LogLevel::Warn, vec![]),
            seen: Default::default(),
        };
        let category: Arc<str> = Arc::from("test");
        for level in LogLevel::ALL_LEVELS {
            recorder.handle(&LogEvent::new(category.clone(), level, "x"));
        }
        assert_eq!(
            *recorder.seen.lock(),
            vec![LogLevel::Warn, LogLevel::Error, LogLevel::Fatal]
        );
    }

    #[test]
    fn test_empty_filters_default_to_any() {
        let settings = TargetSettings::new(LogLevel::All, Vec::new());
        assert_eq!(settings.filters(), vec![CategoryFilter::Any]);
        assert!(settings.matches("whatever"));
    }

    #[test]
    fn test_with_patterns() {
        let settings = TargetSettings::with_patterns(LogLevel::Info, &["db.*", "ui.Main"]).unwrap();
        assert_eq!(settings.level(), LogLevel::Info);
        assert!(settings.matches("db.pool"));
        assert!(!settings.matches("ui.Other"));
        assert!(TargetSettings::with_patterns(LogLevel::Info, &[""]).is_err());
    }

    #[test]
    fn test_subscription_count_never_underflows() {
        let settings = TargetSettings::default();
        settings.unsubscribed();
        assert_eq!(settings.subscription_count(), 0);
        settings.subscribed();
        settings.subscribed();
        settings.unsubscribed();
        assert_eq!(settings.subscription_count(), 1);
    }
}
