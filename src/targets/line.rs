use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::event::LogEvent;
use crate::format::LineFormat;
use crate::level::LogLevel;
use crate::target::{Target, TargetSettings};

/// Sink for rendered lines.
///
/// Implementations decide where a finished line goes; the `LineTarget`
/// owning them has already applied the level gate and the `LineFormat`.
/// Write failures are the sink's business, a sink must not panic.
pub trait LineWriter: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Writes to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutWriter;

impl LineWriter for StdoutWriter {
    fn write_line(&self, line: &str) {
        let _ = writeln!(io::stdout().lock(), "{}", line);
    }
}

/// Writes to standard error in debug builds and discards in release builds,
/// the way a platform debug console only shows output under a debugger.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugWriter;

impl LineWriter for DebugWriter {
    fn write_line(&self, line: &str) {
        if cfg!(debug_assertions) {
            let _ = writeln!(io::stderr().lock(), "{}", line);
        }
    }
}

/// Keeps every line in memory; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct CaptureWriter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Returns and clears the captured lines.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl LineWriter for CaptureWriter {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// A target rendering each event with a `LineFormat` into a `LineWriter`.
pub struct LineTarget<W> {
    settings: TargetSettings,
    format: LineFormat,
    writer: W,
}

/// Writes lines to standard output.
pub type ConsoleTarget = LineTarget<StdoutWriter>;

/// Writes lines to the debug stream (stderr, debug builds only).
pub type DebugConsoleTarget = LineTarget<DebugWriter>;

impl<W: LineWriter> LineTarget<W> {
    pub fn new(writer: W) -> Self {
        Self {
            settings: TargetSettings::default(),
            format: LineFormat::default(),
            writer,
        }
    }

    pub fn with_format(mut self, format: LineFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the initial level. Use `Registry::set_target_level` once registered.
    pub fn with_level(self, level: LogLevel) -> Self {
        self.settings.replace_level(level);
        self
    }

    /// Sets the initial filters. Use `Registry::set_target_patterns` once registered.
    pub fn with_filters<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.settings = TargetSettings::with_patterns(self.settings.level(), patterns)?;
        Ok(self)
    }

    pub fn format(&self) -> &LineFormat {
        &self.format
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl ConsoleTarget {
    pub fn console() -> Self {
        Self::new(StdoutWriter)
    }
}

impl DebugConsoleTarget {
    pub fn debug_console() -> Self {
        Self::new(DebugWriter)
    }
}

impl<W: LineWriter> Target for LineTarget<W> {
    fn settings(&self) -> &TargetSettings {
        &self.settings
    }

    fn on_event(&self, event: &LogEvent) {
        self.writer.write_line(&self.format.render(event));
    }
}
