//! # Category Logger
//!
//! A small logging façade that routes messages by *category*:
//!
//! * **Loggers** are named by dot-delimited categories (`app.net.Socket`) and
//!   handed out by a registry, one instance per category.
//! * **Targets** subscribe to loggers through wildcard filters (`"*"`,
//!   `"app.net.*"`, `"app.Main"`) and drop events below their own level.
//! * **Sinks** include standard output, the debug stream and an SOS Max
//!   socket server, and any `LineWriter` or `Target` you implement.
//!
//! ## Main Components
//!
//! * `Registry`: owns the loggers and targets and keeps their subscriptions
//!   consistent (process-wide instance via `registry::global()`)
//! * `Logger`: formats messages and raises `LogEvent`s to its subscribers
//! * `Target`: the destination trait, with `LineTarget` and `SosTarget`
//!   implementations
//! * `sos`: SOS wire format, background socket connection and standalone client
//! * `bridge`: routes `log` crate records into the registry
//! * `template`: `${Name}` substitution over a `PropertySource`
//!
//! ## Quick Start
//!
//! ```
//! use category_logger::{add_target, get_logger, log_info, log_warn, ConsoleTarget, LogLevel};
//! use std::sync::Arc;
//!
//! // Register targets once at startup
//! add_target(Arc::new(
//!     ConsoleTarget::console()
//!         .with_level(LogLevel::Info)
//!         .with_filters(&["app.*"])
//!         .unwrap(),
//! ));
//!
//! // Loggers can be created before or after the targets
//! let log = get_logger("app.Downloader");
//! log_info!(log, "fetching {} files", 3);
//! log_warn!(log, "retrying {}", "index.html");
//! ```

pub mod bridge;
pub mod category;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod level;
pub mod logger;
pub mod registry;
pub mod sos;
pub mod target;
pub mod targets;
pub mod template;

pub use bridge::init_log_bridge;
pub use category::category_for;
pub use error::{Error, Result};
pub use event::LogEvent;
pub use filter::CategoryFilter;
pub use format::LineFormat;
pub use level::LogLevel;
pub use logger::Logger;
pub use registry::{add_target, get_logger, remove_target, Registry};
pub use target::{Target, TargetSettings};
pub use targets::{
    CaptureWriter, ConsoleTarget, DebugConsoleTarget, LineTarget, LineWriter, SosTarget,
};
