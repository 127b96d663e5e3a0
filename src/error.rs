//! Error types for the logging façade

use std::io;

use thiserror::Error;

/// Errors that can occur while configuring or driving the logging façade
#[derive(Debug, Error)]
pub enum Error {
    /// A level name that does not correspond to any `LogLevel`
    #[error("unknown log level: {0:?}")]
    UnknownLevel(String),

    /// A category filter pattern that cannot be used
    #[error("invalid category filter: {0:?}")]
    InvalidFilter(String),

    /// A `${Name}` token whose property the source does not provide
    #[error("no property named `{0}`")]
    MissingProperty(String),

    /// Connecting to an SOS server failed
    #[error("SOS connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The `log` crate already has a logger installed
    #[error("log bridge could not be installed: {0}")]
    Bridge(#[from] log::SetLoggerError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
