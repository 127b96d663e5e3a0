use category_logger::sos::{wire, Delivery, Endpoint, SosClient, SosConnection};
use category_logger::{log_error, log_info, log_warn, LineFormat, LogLevel, Registry, SosTarget};
use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

/// Reads NUL-terminated frames until `count` have arrived.
fn read_frames(stream: &mut TcpStream, count: usize) -> Vec<String> {
    stream.set_read_timeout(Some(WAIT)).unwrap();
    let mut frames = Vec::new();
    let mut current = Vec::new();
    let mut byte = [0u8; 1];
    while frames.len() < count {
        let n = stream.read(&mut byte).expect("server read");
        assert_eq!(n, 1, "Connection closed before all frames arrived");
        if byte[0] == 0 {
            frames.push(String::from_utf8(std::mem::take(&mut current)).unwrap());
        } else {
            current.push(byte[0]);
        }
    }
    frames
}

fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// A port nothing listens on.
fn closed_port() -> u16 {
    let (listener, port) = listener();
    drop(listener);
    port
}

#[test]
fn test_queued_messages_flush_in_order_exactly_once() {
    let (listener, port) = listener();
    let connection = SosConnection::new();
    let endpoint = Endpoint::new("127.0.0.1", port);

    assert_eq!(connection.send(wire::encode("INFO", "", "lost")), Delivery::Dropped);
    assert_eq!(connection.send_or_connect(wire::encode("INFO", "", "one"), &endpoint), Delivery::Queued);
    for text in ["two", "three"] {
        let delivery = connection.send(wire::encode("INFO", "", text));
        assert!(matches!(delivery, Delivery::Queued | Delivery::Sent));
    }

    let (mut server, _) = listener.accept().unwrap();
    assert!(connection.wait_settled(WAIT));
    assert_eq!(connection.backlog_len(), 0);
    assert_eq!(connection.send(wire::encode("INFO", "", "four")), Delivery::Sent);

    let frames = read_frames(&mut server, 4);
    let expected: Vec<String> = ["one", "two", "three", "four"]
        .iter()
        .map(|t| wire::format_message("INFO", "", t))
        .collect();
    assert_eq!(frames, expected);
}

#[test]
fn test_failed_connect_keeps_backlog_for_next_attempt() {
    let connection = SosConnection::with_timeout(Duration::from_millis(500));
    let endpoint = Endpoint::new("127.0.0.1", closed_port());

    connection.send_or_connect(wire::encode("WARN", "", "first"), &endpoint);
    assert!(!connection.wait_settled(WAIT), "Nothing listens, connect must fail");
    assert!(!connection.is_connecting());
    assert_eq!(connection.backlog_len(), 1);

    // Idle again: a plain send drops, send_or_connect queues and retries
    assert_eq!(connection.send(wire::encode("WARN", "", "dropped")), Delivery::Dropped);
    assert_eq!(connection.send_or_connect(wire::encode("WARN", "", "second"), &endpoint), Delivery::Queued);
    assert!(!connection.wait_settled(WAIT));
    assert_eq!(connection.backlog_len(), 2);
}

#[test]
fn test_disconnect_closes_socket() {
    let (listener, port) = listener();
    let connection = SosConnection::new();
    connection.connect(&Endpoint::new("127.0.0.1", port));
    let (mut server, _) = listener.accept().unwrap();
    assert!(connection.wait_settled(WAIT));

    connection.disconnect();
    assert!(!connection.is_connected());
    assert_eq!(connection.send(wire::encode("INFO", "", "after")), Delivery::Dropped);

    server.set_read_timeout(Some(WAIT)).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(server.read(&mut buf).unwrap(), 0, "Server should see end of stream");
}

#[test]
fn test_sos_target_through_registry() {
    let (listener, port) = listener();
    let registry = Registry::new();
    let target = Arc::new(SosTarget::with_endpoint("127.0.0.1", port).with_level(LogLevel::Info));
    registry.add_target(target.clone());

    let log = registry.get_logger("app.Main");
    log_info!(log, "started <{}>", 1);
    log_warn!(log, "disk at {}%", 91);
    log_error!(log, "boom\ntrace line");

    let (mut server, _) = listener.accept().unwrap();
    assert!(target.connection().wait_settled(WAIT));
    assert!(target.is_connected());

    let frames = read_frames(&mut server, 3);
    assert_eq!(
        frames,
        vec![
            "!SOS<showMessage key=\"INFO\">app.Main started &lt;1&gt;</showMessage>".to_string(),
            "!SOS<showMessage key=\"WARN\">app.Main disk at 91%</showMessage>".to_string(),
            "!SOS<showFoldMessage key=\"ERROR\">\n<title>app.Main boom</title>\n<message>trace line</message>\n</showFoldMessage>".to_string(),
        ]
    );
}

#[test]
fn test_sos_target_without_level_or_category() {
    let (listener, port) = listener();
    let registry = Registry::new();
    let target = Arc::new(
        SosTarget::with_endpoint("127.0.0.1", port)
            .with_format(LineFormat::default().level(false).category(false)),
    );
    registry.add_target(target.clone());

    log_error!(registry.get_logger("x"), "plain");
    let (mut server, _) = listener.accept().unwrap();
    assert_eq!(
        read_frames(&mut server, 1),
        vec![wire::format_message(wire::DEFAULT_KEY, "", "plain")]
    );
}

#[test]
fn test_sos_target_default_endpoint() {
    let target = SosTarget::new();
    assert_eq!(target.endpoint(), &Endpoint::new("localhost", 4444));
    assert!(!target.is_connected());
}

#[test]
fn test_client_requires_explicit_connect() {
    let (listener, port) = listener();
    let client = SosClient::new();
    assert_eq!(client.log("ignored", "INFO"), Delivery::Dropped);

    client.connect("127.0.0.1", port);
    client.debug("queued or sent");
    let (mut server, _) = listener.accept().unwrap();
    assert!(client.connection().wait_settled(WAIT));
    client.log("Countdown finished!", "FATAL");

    assert_eq!(
        read_frames(&mut server, 2),
        vec![
            wire::format_message("DEBUG", "", "queued or sent"),
            wire::format_message("FATAL", "", "Countdown finished!"),
        ]
    );
    assert_eq!(client.endpoint(), Some(Endpoint::new("127.0.0.1", port)));
}

/// Polls `check` until it holds or `limit` elapses.
fn eventually(limit: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    check()
}

#[test]
fn test_stalled_server_does_not_block_logging_threads() {
    let (listener, port) = listener();
    let registry = Arc::new(Registry::new());
    let target = Arc::new(
        SosTarget::with_endpoint("127.0.0.1", port).with_connect_timeout(Duration::from_millis(500)),
    );
    registry.add_target(target.clone());

    // Accepts but never reads
    let stalled = thread::spawn(move || listener.accept().map(|(stream, _)| stream));

    let bulk = registry.get_logger("app.Bulk");
    let chunk = "x".repeat(64 * 1024);
    let started = Instant::now();
    for i in 0..1000 {
        log_info!(bulk, "{} {}", i, chunk);
    }
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "Logging 64 MiB took {:?}",
        started.elapsed()
    );

    let other = registry.clone();
    let tiny = thread::spawn(move || {
        let started = Instant::now();
        log_warn!(other.get_logger("app.Other"), "still responsive");
        started.elapsed()
    });
    assert!(tiny.join().unwrap() < Duration::from_secs(1));

    let _server = stalled.join().unwrap().unwrap();
    assert!(
        eventually(WAIT * 2, || target.connection().failed_writes() > 0),
        "A peer that stops reading must fail the write"
    );
}

#[test]
fn test_failed_write_closes_connection_and_next_send_reconnects() {
    let (listener, port) = listener();
    let connection = SosConnection::new();
    let endpoint = Endpoint::new("127.0.0.1", port);
    connection.connect(&endpoint);
    let (server, _) = listener.accept().unwrap();
    assert!(connection.wait_settled(WAIT));
    drop(server);

    let deadline = Instant::now() + WAIT;
    let mut attempt = 0;
    while connection.is_connected() {
        assert!(Instant::now() < deadline, "Writing to a closed peer never failed");
        assert_eq!(connection.send(wire::encode("INFO", "", &format!("ping {}", attempt))), Delivery::Sent);
        connection.wait_settled(WAIT);
        attempt += 1;
    }

    assert_eq!(connection.failed_writes(), 1);
    assert_eq!(connection.backlog_len(), 0, "Only the failed payload is lost");
    assert_eq!(connection.send(wire::encode("INFO", "", "dropped")), Delivery::Dropped);

    assert_eq!(connection.send_or_connect(wire::encode("INFO", "", "again"), &endpoint), Delivery::Queued);
    let (mut server, _) = listener.accept().unwrap();
    assert!(connection.wait_settled(WAIT));
    assert_eq!(read_frames(&mut server, 1), vec![wire::format_message("INFO", "", "again")]);
}

#[test]
fn test_sos_target_reconnects_after_failed_write() {
    let (listener, port) = listener();
    let registry = Registry::new();
    let target = Arc::new(
        SosTarget::with_endpoint("127.0.0.1", port).with_format(LineFormat::default().category(false)),
    );
    registry.add_target(target.clone());
    let log = registry.get_logger("app");

    log_info!(log, "first");
    let (server, _) = listener.accept().unwrap();
    assert!(target.connection().wait_settled(WAIT));
    drop(server);

    let deadline = Instant::now() + WAIT;
    while target.connection().failed_writes() == 0 {
        assert!(Instant::now() < deadline, "Writing to a closed peer never failed");
        log_info!(log, "ping");
        target.connection().wait_settled(WAIT);
    }
    assert!(!target.is_connected());

    log_info!(log, "back again");
    let (mut server, _) = listener.accept().unwrap();
    assert!(target.connection().wait_settled(WAIT));
    assert!(target.is_connected());
    assert_eq!(read_frames(&mut server, 1), vec![wire::format_message("INFO", "", "back again")]);
}

#[test]
fn test_write_timeout_keeps_rest_of_queue() {
    const PAYLOADS: usize = 16;
    let (listener, port) = listener();
    let connection = SosConnection::with_timeout(Duration::from_millis(300));
    let endpoint = Endpoint::new("127.0.0.1", port);

    for _ in 0..PAYLOADS {
        let delivery = connection.send_or_connect(vec![b'x'; 4 << 20], &endpoint);
        assert!(matches!(delivery, Delivery::Queued | Delivery::Sent));
    }
    let (_server, _) = listener.accept().unwrap();

    assert!(
        eventually(WAIT * 2, || connection.failed_writes() == 1),
        "A write to a peer that never reads must time out"
    );
    assert!(!connection.is_connected());
    let left = connection.backlog_len();
    assert!(left > 0 && left < PAYLOADS, "{} payloads left", left);
}
