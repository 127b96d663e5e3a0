use std::time::Duration;

use crate::error::Result;
use crate::event::LogEvent;
use crate::format::LineFormat;
use crate::level::LogLevel;
use crate::sos::{wire, Endpoint, SosConnection};
use crate::target::{Target, TargetSettings};

/// Sends events to an SOS Max server.
///
/// The first event starts a background connect to the configured endpoint
/// (`localhost:4444` by default). Events raised before the socket opens are
/// queued and flushed in order once it does; if the attempt fails they stay
/// queued and the next event triggers a new attempt. Writes happen on the
/// connection's background thread; a write that fails or times out closes
/// the socket, and the next event reconnects.
///
/// Of the `LineFormat`, only `include_level` (used as the SOS key),
/// `include_category` and `field_separator` apply; SOS stamps its own time.
pub struct SosTarget {
    settings: TargetSettings,
    format: LineFormat,
    endpoint: Endpoint,
    connection: SosConnection,
}

impl SosTarget {
    /// A target for `localhost:4444`, accepting every level and category.
    pub fn new() -> Self {
        Self::with_endpoint(wire::DEFAULT_HOST, wire::DEFAULT_PORT)
    }

    pub fn with_endpoint(host: impl Into<String>, port: u16) -> Self {
        Self {
            settings: TargetSettings::default(),
            format: LineFormat::default(),
            endpoint: Endpoint::new(host, port),
            connection: SosConnection::new(),
        }
    }

    /// Sets how long connect attempts and writes may take before failing.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connection = SosConnection::with_timeout(timeout);
        self
    }

    pub fn with_format(mut self, format: LineFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        self.settings.replace_level(level);
        self
    }

    pub fn with_filters<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.settings = TargetSettings::with_patterns(self.settings.level(), patterns)?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The connection carrying this target's messages.
    pub fn connection(&self) -> &SosConnection {
        &self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    fn encode(&self, event: &LogEvent) -> Vec<u8> {
        let key = if self.format.include_level {
            event.level.label()
        } else {
            wire::DEFAULT_KEY
        };

        let prefix = if self.format.include_category {
            format!("{}{}", event.category, self.format.field_separator)
        } else {
            String::new()
        };

        wire::encode(key, &prefix, &event.message)
    }
}

impl Default for SosTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for SosTarget {
    fn settings(&self) -> &TargetSettings {
        &self.settings
    }

    fn on_event(&self, event: &LogEvent) {
        let payload = self.encode(event);
        self.connection.send_or_connect(payload, &self.endpoint);
    }
}
