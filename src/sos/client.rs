use lazy_static::lazy_static;

use super::connection::{Delivery, Endpoint, SosConnection};
use super::wire;

/// A direct SOS client, independent of the category registry.
///
/// Unlike `SosTarget`, the client never connects on its own: call `connect`
/// first. Messages logged while connecting are queued and sent once the
/// socket opens; messages logged while disconnected are dropped.
///
/// # Examples
///
/// ```no_run
/// # use category_logger::sos;
/// let client = sos::client();
/// client.connect_default();
/// client.log("Countdown started!", "INFO");
/// client.log("Countdown finished!", "FATAL");
/// ```
pub struct SosClient {
    connection: SosConnection,
}

impl SosClient {
    /// Creates a disconnected client.
    pub fn new() -> Self {
        Self {
            connection: SosConnection::new(),
        }
    }

    /// Starts connecting to an SOS server in the background.
    ///
    /// Returns immediately. Messages logged before the socket opens are
    /// queued and sent in order once it does.
    ///
    /// # Arguments
    ///
    /// * `host` - Host name or address of the server
    /// * `port` - TCP port, `4444` for a stock SOS Max
    pub fn connect(&self, host: &str, port: u16) {
        self.connection.connect(&Endpoint::new(host, port));
    }

    /// Connects to `localhost:4444`.
    pub fn connect_default(&self) {
        self.connection.connect(&Endpoint::default());
    }

    /// Closes the socket; later messages are dropped until the next `connect`.
    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    /// Sends `message` shown under `key` (usually a level label).
    ///
    /// # Arguments
    ///
    /// * `message` - Text to show; a multi-line message becomes a fold
    ///   message titled by its first line
    /// * `key` - SOS key the viewer colors the message by
    ///
    /// # Returns
    ///
    /// `Delivery::Dropped` unless `connect` was called first.
    ///
    /// # Thread Safety
    ///
    /// Safe to call from any thread; the socket is written by a background
    /// thread, so this never blocks on the network.
    pub fn log(&self, message: &str, key: &str) -> Delivery {
        self.connection.send(wire::encode(key, "", message))
    }

    /// `log` with the default `DEBUG` key.
    pub fn debug(&self, message: &str) -> Delivery {
        self.log(message, wire::DEFAULT_KEY)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Server of the most recent `connect`.
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.connection.endpoint()
    }

    /// The underlying connection, for waiting on or inspecting its state.
    pub fn connection(&self) -> &SosConnection {
        &self.connection
    }
}

impl Default for SosClient {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Client shared by the whole process.
    static ref CLIENT: SosClient = SosClient::new();
}

/// The process-wide client.
pub fn client() -> &'static SosClient {
    &CLIENT
}
