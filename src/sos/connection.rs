use std::collections::VecDeque;
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::error::Error;

/// How long a single connect attempt, or a single write, may take.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Most payloads a connection holds before it starts dropping new ones.
pub const QUEUE_LIMIT: usize = 4096;

/// Host and port of an SOS server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(super::wire::DEFAULT_HOST, super::wire::DEFAULT_PORT)
    }
}

/// What happened to a payload handed to `SosConnection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the writer of the open socket.
    Sent,
    /// Queued until the pending connect attempt completes.
    Queued,
    /// Discarded: no connection exists or is being made, or the queue is full.
    Dropped,
}

enum LinkState {
    Idle,
    Connecting,
    // Shutdown handle; the link thread writes through its own clone.
    Connected(TcpStream),
}

struct Link {
    state: LinkState,
    backlog: VecDeque<Vec<u8>>,
    // The link thread holds a popped payload it has not finished writing.
    writing: bool,
    endpoint: Option<Endpoint>,
    // Bumped on every connect/disconnect so late results are ignored.
    generation: u64,
    failed_writes: u64,
}

impl Link {
    fn busy(&self) -> bool {
        match self.state {
            LinkState::Idle => false,
            LinkState::Connecting => true,
            LinkState::Connected(_) => self.writing || !self.backlog.is_empty(),
        }
    }
}

struct Shared {
    link: Mutex<Link>,
    changed: Condvar,
}

/// A socket to an SOS server, connected and written in the background.
///
/// `connect` returns immediately; a helper thread opens the socket and then
/// writes every payload handed to the connection, so logging never waits on
/// the network. Payloads sent while the attempt is in flight are queued and
/// written, oldest first, as soon as the socket opens, before any later
/// payload. If the attempt fails the queue is kept for the next attempt.
///
/// Writes time out after the connect timeout. A failed write closes the
/// socket and loses that payload; whatever is still queued behind it waits
/// for the next connection. Nothing is retried on its own.
///
/// # Thread Safety
///
/// All methods take `&self` and may be called from any thread. They hold an
/// internal mutex only long enough to update the queue and state; no method
/// except `wait_settled` blocks on the socket.
pub struct SosConnection {
    shared: Arc<Shared>,
    connect_timeout: Duration,
}

impl SosConnection {
    /// Creates an idle connection using `DEFAULT_CONNECT_TIMEOUT`.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_CONNECT_TIMEOUT)
    }

    /// Creates an idle connection whose connect attempts and writes give up
    /// after `connect_timeout`.
    pub fn with_timeout(connect_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                link: Mutex::new(Link {
                    state: LinkState::Idle,
                    backlog: VecDeque::new(),
                    writing: false,
                    endpoint: None,
                    generation: 0,
                    failed_writes: 0,
                }),
                changed: Condvar::new(),
            }),
            connect_timeout,
        }
    }

    /// Starts connecting to `endpoint`, closing any open socket first.
    ///
    /// Does nothing if an attempt to the same endpoint is already running.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Server to connect to; remembered and reported by
    ///   `endpoint()`
    pub fn connect(&self, endpoint: &Endpoint) {
        let mut link = self.shared.link.lock();
        if matches!(link.state, LinkState::Connecting) && link.endpoint.as_ref() == Some(endpoint) {
            return;
        }
        self.start_connect(&mut link, endpoint);
    }

    /// Closes the socket and abandons any attempt in flight.
    ///
    /// Queued payloads stay queued. A payload the background thread is
    /// writing at that moment is lost.
    pub fn disconnect(&self) {
        let mut link = self.shared.link.lock();
        link.generation += 1;
        link.writing = false;
        close(&mut link);
        self.shared.changed.notify_all();
    }

    /// Hands `payload` to the socket writer if connected, queues it if
    /// connecting, drops it otherwise.
    ///
    /// # Returns
    ///
    /// What happened to the payload. `Sent` means the payload is queued for
    /// the open socket; a later write failure is reported through
    /// `failed_writes`, not here.
    pub fn send(&self, payload: Vec<u8>) -> Delivery {
        let mut link = self.shared.link.lock();
        let delivery = enqueue(&mut link, payload);
        if delivery == Delivery::Sent {
            self.shared.changed.notify_all();
        }
        delivery
    }

    /// Like `send`, but an idle connection starts connecting to `endpoint`
    /// and queues the payload.
    ///
    /// # Arguments
    ///
    /// * `payload` - Encoded bytes, usually from `wire::encode`
    /// * `endpoint` - Server to connect to if no connection exists
    pub fn send_or_connect(&self, payload: Vec<u8>, endpoint: &Endpoint) -> Delivery {
        let mut link = self.shared.link.lock();
        if matches!(link.state, LinkState::Idle) {
            self.start_connect(&mut link, endpoint);
        }
        let delivery = enqueue(&mut link, payload);
        if delivery == Delivery::Sent {
            self.shared.changed.notify_all();
        }
        delivery
    }

    /// Blocks until no connect attempt is in flight and every queued payload
    /// has been written, or until `timeout` elapses.
    ///
    /// # Returns
    ///
    /// Whether the socket is open afterwards.
    pub fn wait_settled(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut link = self.shared.link.lock();
        while link.busy() {
            if self.shared.changed.wait_until(&mut link, deadline).timed_out() {
                break;
            }
        }
        matches!(link.state, LinkState::Connected(_))
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.shared.link.lock().state, LinkState::Connected(_))
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.shared.link.lock().state, LinkState::Connecting)
    }

    /// Number of payloads waiting to be written.
    pub fn backlog_len(&self) -> usize {
        self.shared.link.lock().backlog.len()
    }

    /// How many writes have failed and closed the socket.
    pub fn failed_writes(&self) -> u64 {
        self.shared.link.lock().failed_writes
    }

    /// Endpoint of the most recent connect call.
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.shared.link.lock().endpoint.clone()
    }

    fn start_connect(&self, link: &mut MutexGuard<'_, Link>, endpoint: &Endpoint) {
        close(link);
        link.generation += 1;
        link.writing = false;
        link.state = LinkState::Connecting;
        link.endpoint = Some(endpoint.clone());

        let shared = self.shared.clone();
        let target = endpoint.clone();
        let generation = link.generation;
        let timeout = self.connect_timeout;
        let spawned = thread::Builder::new()
            .name("sos-link".to_string())
            .spawn(move || run_link(&shared, &target, generation, timeout));

        if let Err(err) = spawned {
            warn!(error = %err, "could not spawn SOS link thread");
            link.state = LinkState::Idle;
        }
    }
}

impl Default for SosConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SosConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn enqueue(link: &mut Link, payload: Vec<u8>) -> Delivery {
    let delivery = match link.state {
        LinkState::Idle => return Delivery::Dropped,
        LinkState::Connecting => Delivery::Queued,
        LinkState::Connected(_) => Delivery::Sent,
    };

    if link.backlog.len() >= QUEUE_LIMIT {
        trace!(limit = QUEUE_LIMIT, "SOS queue full, dropping payload");
        return Delivery::Dropped;
    }
    link.backlog.push_back(payload);
    delivery
}

fn close(link: &mut Link) {
    if let LinkState::Connected(stream) = &link.state {
        let _ = stream.shutdown(Shutdown::Both);
    }
    link.state = LinkState::Idle;
}

fn open_stream(endpoint: &Endpoint, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (endpoint.host.as_str(), endpoint.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                stream.set_write_timeout(Some(timeout))?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "host resolved to no addresses")
    }))
}

/// Body of the background thread: connect, then write queued payloads until
/// the connection is superseded or a write fails.
fn run_link(shared: &Shared, endpoint: &Endpoint, generation: u64, timeout: Duration) {
    let result = open_stream(endpoint, timeout);
    let Some(mut stream) = finish_connect(shared, endpoint, generation, result) else {
        return;
    };

    loop {
        let payload = {
            let mut link = shared.link.lock();
            loop {
                if link.generation != generation {
                    return;
                }
                if let Some(payload) = link.backlog.pop_front() {
                    link.writing = true;
                    break payload;
                }
                shared.changed.wait(&mut link);
            }
        };

        let written = stream.write_all(&payload);

        let mut link = shared.link.lock();
        if link.generation != generation {
            return;
        }
        link.writing = false;

        if let Err(err) = written {
            link.failed_writes += 1;
            warn!(
                error = %err,
                host = %endpoint.host,
                port = endpoint.port,
                queued = link.backlog.len(),
                "SOS write failed, closing connection"
            );
            close(&mut link);
            shared.changed.notify_all();
            return;
        }

        if link.backlog.is_empty() {
            shared.changed.notify_all();
        }
    }
}

fn finish_connect(
    shared: &Shared,
    endpoint: &Endpoint,
    generation: u64,
    result: io::Result<TcpStream>,
) -> Option<TcpStream> {
    let mut link = shared.link.lock();
    if link.generation != generation {
        debug!(host = %endpoint.host, port = endpoint.port, "discarding superseded SOS connect");
        return None;
    }

    let opened = result.and_then(|stream| {
        let handle = stream.try_clone()?;
        Ok((stream, handle))
    });

    let stream = match opened {
        Ok((stream, handle)) => {
            debug!(
                host = %endpoint.host,
                port = endpoint.port,
                queued = link.backlog.len(),
                "SOS connected"
            );
            link.state = LinkState::Connected(handle);
            Some(stream)
        }
        Err(source) => {
            let err = Error::Connect {
                host: endpoint.host.clone(),
                port: endpoint.port,
                source,
            };
            warn!(error = %err, queued = link.backlog.len(), "SOS connect failed");
            link.state = LinkState::Idle;
            None
        }
    };

    shared.changed.notify_all();
    stream
}
