//! Integration tests for the TCP link against a local fake gateway.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use mysgw_link::{Connector, Link, MessageHandler, NetworkLink, StreamConnector, TransportConfig, TransportError};
use mysgw_protocol::{InternalType, Message, ValueType};
use serial_test::serial;

/// A listening fake gateway plus the connected link.
fn connect_pair() -> (NetworkLink, TcpStream, Receiver<Message>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let (tx, rx) = unbounded();
    let handler: Arc<dyn MessageHandler> = Arc::new(move |msg: Message| {
        let _ = tx.send(msg);
    });
    let link = NetworkLink::connect("127.0.0.1", port, handler).expect("connect");
    let (gateway, _) = listener.accept().expect("accept");
    (link, gateway, rx)
}

const WAIT: Duration = Duration::from_secs(2);

// ============================================================================
// Inbound
// ============================================================================

#[test]
#[serial]
fn test_fragmented_transmission_is_delivered() {
    let (link, mut gateway, rx) = connect_pair();

    gateway.write_all(b"1;0;0;0;17;55.7;").unwrap();
    gateway.flush().unwrap();
    thread::sleep(Duration::from_millis(20));
    gateway.write_all(b"13.0;18\n5;3;1;0;2;1\n").unwrap();

    let first = rx.recv_timeout(WAIT).expect("first frame");
    assert_eq!(first.payload, "55.7;13.0;18");
    let second = rx.recv_timeout(WAIT).expect("second frame");
    assert_eq!(second.encode(), "5;3;1;0;2;1\n");

    link.close();
}

#[test]
#[serial]
fn test_malformed_frame_is_skipped() {
    let (link, mut gateway, rx) = connect_pair();

    gateway.write_all(b"1;2;9;0;0;x\n5;3;1;0;2;10.5\n").unwrap();

    let msg = rx.recv_timeout(WAIT).expect("good frame after bad one");
    assert_eq!((msg.node_id, msg.sensor_id), (5, 3));
    assert_eq!(msg.payload, "10.5");
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    assert!(!link.is_failing());

    link.close();
}

// ============================================================================
// Outbound
// ============================================================================

#[test]
#[serial]
fn test_write_reaches_gateway() {
    let (link, gateway, _rx) = connect_pair();

    assert!(link.write(&Message::internal(0, 0, InternalType::Version, "")));
    assert!(link.write(&Message::set(12, 1, ValueType::Rgb, "ffffff")));

    let mut lines = BufReader::new(gateway).lines();
    assert_eq!(lines.next().unwrap().unwrap(), "0;0;3;0;2;");
    assert_eq!(lines.next().unwrap().unwrap(), "12;1;1;0;40;ffffff");

    link.close();
}

#[test]
#[serial]
fn test_concurrent_writes_do_not_interleave() {
    let (link, gateway, _rx) = connect_pair();
    let link = Arc::new(link);

    let writers: Vec<_> = (0..4u8)
        .map(|node| {
            let link = Arc::clone(&link);
            thread::spawn(move || {
                for i in 0..50u8 {
                    let payload = format!("{node}-{i}-{}", "x".repeat(40));
                    assert!(link.write(&Message::set(node + 1, i, ValueType::Text, payload)));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let reader = BufReader::new(gateway);
    let mut count = 0;
    for line in reader.lines().take(200) {
        let line = line.unwrap();
        let msg = Message::decode(&line).expect("every line is a whole frame");
        assert!(msg.payload.starts_with(&format!("{}-", msg.node_id - 1)));
        count += 1;
    }
    assert_eq!(count, 200);

    link.close();
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
#[serial]
fn test_no_events_after_close() {
    let (link, mut gateway, rx) = connect_pair();

    link.close();
    link.close();
    assert!(!link.write(&Message::internal(0, 0, InternalType::Version, "")));

    // The peer may or may not notice the shutdown before this write.
    let _ = gateway.write_all(b"5;3;1;0;2;1\n");
    assert!(rx.recv_timeout(Duration::from_millis(400)).is_err());
}

#[test]
#[serial]
fn test_peer_disconnect_marks_link_failing() {
    let (link, gateway, _rx) = connect_pair();
    drop(gateway);

    let mut failing = false;
    for _ in 0..100 {
        if link.is_failing() {
            failing = true;
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    assert!(failing, "EOF from the gateway should raise the failing flag");
    link.close();
}

#[test]
#[serial]
fn test_connector_opens_network_link() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handler: Arc<dyn MessageHandler> = Arc::new(|_msg: Message| {});

    let link = StreamConnector
        .connect(&TransportConfig::network("127.0.0.1", port), handler)
        .expect("connect");
    assert_eq!(link.describe(), format!("network 127.0.0.1:{port}"));
    link.close();
}

#[test]
#[serial]
fn test_connection_refused() {
    // Grab a free port, then release it so nothing is listening.
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let handler: Arc<dyn MessageHandler> = Arc::new(|_msg: Message| {});

    let err = NetworkLink::connect("127.0.0.1", port, handler).err().expect("nothing listening");
    assert!(matches!(err, TransportError::Connect { .. }), "got {err}");
}

#[test]
fn test_missing_serial_device() {
    let handler: Arc<dyn MessageHandler> = Arc::new(|_msg: Message| {});
    let result = StreamConnector.connect(&TransportConfig::serial("/dev/mysgw-no-such-device"), handler);
    assert!(result.is_err());
}
