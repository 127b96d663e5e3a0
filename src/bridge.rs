//! Routes records from the `log` crate macros into the process-wide registry.
//!
//! Each record's target (by default the module path of the call site) is
//! turned into a category, so `log::info!` inside `app::net` reaches the
//! targets filtering on `app.net.*`.

use log::{LevelFilter, Log, Metadata, Record};

use crate::category;
use crate::error::Result;
use crate::level::LogLevel;
use crate::registry;

struct LogBridge;

static BRIDGE: LogBridge = LogBridge;

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        registry::global().is_enabled(LogLevel::from(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        let level = LogLevel::from(record.level());
        if !registry::global().is_enabled(level) {
            return;
        }

        let logger = registry::get_logger(&category::from_path(record.target()));
        logger.log(level, *record.args());
    }

    fn flush(&self) {}
}

/// Installs the bridge as the `log` crate's logger.
///
/// Fails if any logger, this one included, is already installed.
pub fn init_log_bridge() -> Result<()> {
    log::set_logger(&BRIDGE)?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
