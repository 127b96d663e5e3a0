use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::Result;
use crate::filter::CategoryFilter;
use crate::level::LogLevel;
use crate::logger::{Logger, NO_TARGETS};
use crate::target::{Target, TargetSettings};

/// Category registry connecting loggers to targets.
///
/// The registry owns one `Logger` per category and the list of registered
/// targets, and keeps the subscriptions between them consistent with the
/// targets' filters:
///
/// * `get_logger` creates a logger on first request and subscribes every
///   matching target to it (re-evaluated on every call, idempotent).
/// * `add_target` subscribes the new target to every matching logger that
///   already exists.
/// * `remove_target` unsubscribes the target from every logger.
///
/// The registry also tracks the lowest level accepted by any target. Loggers
/// read it through a shared atomic so the logging path never takes the
/// registry lock.
///
/// # Thread Safety
///
/// All operations lock a single mutex; logging itself does not. Most
/// programs use the process-wide instance returned by `global()` through the
/// free functions of this module, while tests and embedders can create
/// independent instances with `Registry::new()`.
pub struct Registry {
    inner: Mutex<Inner>,
    min_level: Arc<AtomicU8>,
}

#[derive(Default)]
struct Inner {
    loggers: HashMap<String, Arc<Logger>>,
    targets: Vec<Arc<dyn Target>>,
}

impl Registry {
    /// Creates an empty registry, independent of the process-wide one.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            min_level: Arc::new(AtomicU8::new(NO_TARGETS)),
        }
    }

    /// Returns the logger for `category`, creating it on first use.
    ///
    /// Every call re-checks the registered targets' filters against
    /// `category` and subscribes any matching target that is not yet
    /// subscribed. Targets are never subscribed twice.
    ///
    /// # Arguments
    ///
    /// * `category` - Dotted category name, e.g. `"app.net.Socket"`
    ///
    /// # Returns
    ///
    /// The shared logger; every call with the same category returns the
    /// same `Arc`.
    ///
    /// # Thread Safety
    ///
    /// Takes the registry lock. Keep the returned logger around instead of
    /// looking it up on every message.
    ///
    /// # Examples
    ///
    /// ```
    /// # use category_logger::Registry;
    /// # use std::sync::Arc;
    /// let registry = Registry::new();
    /// let a = registry.get_logger("app.Main");
    /// let b = registry.get_logger("app.Main");
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn get_logger(&self, category: &str) -> Arc<Logger> {
        let mut inner = self.inner.lock();

        let existing = inner.loggers.get(category).cloned();
        let logger = match existing {
            Some(logger) => logger,
            None => {
                trace!(category, "creating logger");
                let logger = Arc::new(Logger::new(category, self.min_level.clone()));
                inner.loggers.insert(category.to_string(), logger.clone());
                logger
            }
        };

        for target in &inner.targets {
            if target.settings().matches(category) {
                logger.subscribe(target);
            }
        }

        logger
    }

    /// Registers a target and subscribes it to every matching logger.
    ///
    /// Loggers requested later are subscribed by `get_logger`. Registering a
    /// target that is already registered does nothing.
    ///
    /// # Arguments
    ///
    /// * `target` - The target; identity is the `Arc` pointer, so keep a
    ///   clone to remove or reconfigure it later
    ///
    /// # Thread Safety
    ///
    /// Safe to call while other threads log. A message being dispatched
    /// concurrently may or may not reach the new target.
    pub fn add_target(&self, target: Arc<dyn Target>) {
        let mut inner = self.inner.lock();
        Self::attach(&mut inner, target, &self.min_level);
    }

    /// Unregisters a target and unsubscribes it from every logger.
    ///
    /// # Returns
    ///
    /// `false` if the target was not registered.
    pub fn remove_target(&self, target: &Arc<dyn Target>) -> bool {
        let mut inner = self.inner.lock();
        let registered = Self::detach(&mut inner, target);
        Self::reset_min_level(&inner, &self.min_level);
        registered
    }

    /// Changes the level of a target.
    ///
    /// A registered target is detached, updated and attached again under a
    /// single lock, so the registry minimum follows the new level and no
    /// concurrent `remove_target` can be undone. An unregistered target is
    /// only updated.
    pub fn set_target_level(&self, target: &Arc<dyn Target>, level: LogLevel) {
        self.reconfigure(target, |settings| settings.replace_level(level));
    }

    /// Changes the filters of a target and re-evaluates its subscriptions.
    ///
    /// An empty list means `"*"`. Registration is handled as in
    /// `set_target_level`.
    pub fn set_target_filters(&self, target: &Arc<dyn Target>, filters: Vec<CategoryFilter>) {
        self.reconfigure(target, |settings| settings.replace_filters(filters));
    }

    /// `set_target_filters` for pattern strings.
    ///
    /// Nothing changes if any pattern fails to parse.
    pub fn set_target_patterns<S: AsRef<str>>(
        &self,
        target: &Arc<dyn Target>,
        patterns: &[S],
    ) -> Result<()> {
        let filters = patterns
            .iter()
            .map(|pattern| CategoryFilter::parse(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.set_target_filters(target, filters);
        Ok(())
    }

    /// Lowest level any registered target accepts, `None` with no targets.
    pub fn min_level(&self) -> Option<LogLevel> {
        match self.min_level.load(Ordering::Acquire) {
            NO_TARGETS => None,
            raw => LogLevel::from_u8(raw),
        }
    }

    /// Whether some registered target accepts `level`.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.min_level().is_some_and(|min| level >= min)
    }

    /// Number of registered targets.
    pub fn target_count(&self) -> usize {
        self.inner.lock().targets.len()
    }

    /// Number of categories a logger has been created for.
    pub fn logger_count(&self) -> usize {
        self.inner.lock().loggers.len()
    }

    /// Whether this exact target (by `Arc` pointer) is registered.
    pub fn is_registered(&self, target: &Arc<dyn Target>) -> bool {
        self.inner.lock().targets.iter().any(|t| Arc::ptr_eq(t, target))
    }

    fn reconfigure(&self, target: &Arc<dyn Target>, change: impl FnOnce(&TargetSettings)) {
        let mut inner = self.inner.lock();
        let registered = Self::detach(&mut inner, target);
        change(target.settings());
        if registered {
            Self::attach(&mut inner, target.clone(), &self.min_level);
            Self::reset_min_level(&inner, &self.min_level);
        }
    }

    fn attach(inner: &mut Inner, target: Arc<dyn Target>, min_level: &AtomicU8) {
        if inner.targets.iter().any(|t| Arc::ptr_eq(t, &target)) {
            return;
        }

        let settings = target.settings();
        let mut subscribed = 0;
        for (category, logger) in &inner.loggers {
            if settings.matches(category) && logger.subscribe(&target) {
                subscribed += 1;
            }
        }

        let level = settings.level();
        debug!(%level, subscribed, "target added");

        inner.targets.push(target);
        let current = min_level.load(Ordering::Acquire);
        if current == NO_TARGETS || level.as_u8() < current {
            min_level.store(level.as_u8(), Ordering::Release);
        }
    }

    fn detach(inner: &mut Inner, target: &Arc<dyn Target>) -> bool {
        for logger in inner.loggers.values() {
            logger.unsubscribe(target);
        }

        let before = inner.targets.len();
        inner.targets.retain(|t| !Arc::ptr_eq(t, target));
        let registered = inner.targets.len() != before;
        if registered {
            debug!(level = %target.settings().level(), "target removed");
        }
        registered
    }

    fn reset_min_level(inner: &Inner, min_level: &AtomicU8) {
        let min = inner
            .targets
            .iter()
            .map(|t| t.settings().level().as_u8())
            .min()
            .unwrap_or(NO_TARGETS);
        min_level.store(min, Ordering::Release);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// The process-wide registry behind the free functions of this module.
    static ref GLOBAL: Registry = Registry::new();
}

/// The process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// `Registry::get_logger` on the process-wide registry.
pub fn get_logger(category: &str) -> Arc<Logger> {
    GLOBAL.get_logger(category)
}

/// `Registry::add_target` on the process-wide registry.
pub fn add_target(target: Arc<dyn Target>) {
    GLOBAL.add_target(target)
}

/// `Registry::remove_target` on the process-wide registry.
pub fn remove_target(target: &Arc<dyn Target>) -> bool {
    GLOBAL.remove_target(target)
}
