//! Tests for Session
//!
//! These tests verify:
//! - Storage, retrieval, deletion and counter semantics
//! - Statistics and flush
//! - Session lifecycle (connect / quit / drop)
//! - Connection failures vs protocol faults
//! - Serialized sharing across threads

#[path = "../common/mod.rs"]
mod common;

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use memline::{Config, MemcacheError, Session, SessionState, StoreOp};
use parking_lot::Mutex;

use common::{scripted, serve_once, FakeServer};

// =============================================================================
// Storage / Retrieval Tests
// =============================================================================

#[test]
fn test_set_get_add_scenario() {
    let server = FakeServer::start();
    let mut session = server.connect();

    assert!(session.set("foo", "bar").unwrap());
    assert_eq!(session.get("foo").unwrap(), Some(b"bar".to_vec()));
    assert!(!session.add("foo", "baz").unwrap());
    assert_eq!(session.get("foo").unwrap(), Some(b"bar".to_vec()));
}

#[test]
fn test_round_trip_payloads() {
    let server = FakeServer::start();
    let mut session = server.connect();

    let long = "x".repeat(100_000);
    let payloads: Vec<&[u8]> = vec![
        &b""[..],
        &b"bar"[..],
        &b"hello there, general kenobi"[..],
        long.as_bytes(),
        &b"line one\r\nEND\r\nline three"[..],
        &[0x00, 0xFF, 0x80, b'\n'][..],
    ];

    for (i, payload) in payloads.into_iter().enumerate() {
        let key = format!("key{}", i);
        assert!(session.set(&key, payload).unwrap());
        assert_eq!(session.get(&key).unwrap().as_deref(), Some(payload));
    }
}

#[test]
fn test_empty_value_is_not_absent() {
    let server = FakeServer::start();
    let mut session = server.connect();

    session.set("empty", "").unwrap();

    assert_eq!(session.get("empty").unwrap(), Some(Vec::new()));
    assert_eq!(session.get("never-set").unwrap(), None);
}

#[test]
fn test_add_if_absent() {
    let server = FakeServer::start();
    let mut session = server.connect();

    assert!(session.add("fresh", "first").unwrap());
    assert!(!session.add("fresh", "second").unwrap());
    assert_eq!(session.get("fresh").unwrap(), Some(b"first".to_vec()));
}

#[test]
fn test_replace_append_prepend() {
    let server = FakeServer::start();
    let mut session = server.connect();

    assert!(!session.replace("k", "v").unwrap());
    assert!(!session.append("k", "v").unwrap());
    assert!(!session.prepend("k", "v").unwrap());
    assert_eq!(session.get("k").unwrap(), None);

    session.set("k", "mid").unwrap();
    assert!(session.append("k", "-end").unwrap());
    assert!(session.prepend("k", "start-").unwrap());
    assert_eq!(session.get("k").unwrap(), Some(b"start-mid-end".to_vec()));

    assert!(session.replace("k", "new").unwrap());
    assert_eq!(session.get("k").unwrap(), Some(b"new".to_vec()));
}

#[test]
fn test_store_with_ttl_on_the_wire() {
    let server = FakeServer::start();
    let mut session = server.connect();

    assert!(session.store(StoreOp::Set, "ttl", "v", 60).unwrap());
    assert!(session.store(StoreOp::Add, "ttl2", "v", 0).unwrap());
    session.quit().unwrap();

    // quit is the last line the server sees
    thread::sleep(Duration::from_millis(50));
    assert_eq!(
        server.received(),
        vec!["set ttl 0 60 1", "add ttl2 0 0 1", "quit"]
    );
}

#[test]
fn test_get_never_set_is_absent() {
    let server = FakeServer::start();
    let mut session = server.connect();

    assert_eq!(session.get("nope").unwrap(), None);
    assert_eq!(session.get_value("nope").unwrap(), None);
}

#[test]
fn test_get_value_exposes_flags() {
    let (mut session, _handle) = scripted(b"VALUE foo 42 3\r\nbar\r\nEND\r\n");

    let value = session.get_value("foo").unwrap().unwrap();
    assert_eq!(value.key, "foo");
    assert_eq!(value.flags, 42);
    assert_eq!(value.data, b"bar");
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete() {
    let server = FakeServer::start();
    let mut session = server.connect();

    assert!(!session.delete("ghost").unwrap());

    session.set("doomed", "x").unwrap();
    assert!(session.delete("doomed").unwrap());
    assert_eq!(session.get("doomed").unwrap(), None);
}

// =============================================================================
// Counter Tests
// =============================================================================

#[test]
fn test_counter_on_absent_key() {
    let server = FakeServer::start();
    let mut session = server.connect();

    assert_eq!(session.incr("missing", 1).unwrap(), None);
    assert_eq!(session.decr("missing", 1).unwrap(), None);
}

#[test]
fn test_counter_round_trip() {
    let server = FakeServer::start();
    let mut session = server.connect();

    session.set("counter", "10").unwrap();
    assert_eq!(session.incr("counter", 5).unwrap(), Some(15));
    assert_eq!(session.decr("counter", 5).unwrap(), Some(10));
    assert_eq!(session.get("counter").unwrap(), Some(b"10".to_vec()));
}

#[test]
fn test_decr_clamps_at_zero() {
    let server = FakeServer::start();
    let mut session = server.connect();

    session.set("counter", "3").unwrap();
    assert_eq!(session.decr("counter", 10).unwrap(), Some(0));
}

#[test]
fn test_incr_non_numeric_is_server_error() {
    let server = FakeServer::start();
    let mut session = server.connect();

    session.set("text", "abc").unwrap();
    let err = session.incr("text", 1).unwrap_err();

    assert!(matches!(err, MemcacheError::Server(_)));
    assert!(session.is_open());
    assert_eq!(session.get("text").unwrap(), Some(b"abc".to_vec()));
}

// =============================================================================
// Stats / Flush Tests
// =============================================================================

#[test]
fn test_stats() {
    let server = FakeServer::start();
    let mut session = server.connect();

    let stats = session.stats().unwrap();
    assert!(!stats.is_empty());
    assert!(stats.contains("pid"));
    assert_eq!(stats.get_parsed::<u32>("pid"), Some(std::process::id()));
}

#[test]
fn test_stat_filter() {
    let server = FakeServer::start();
    let mut session = server.connect();

    assert_eq!(session.stat("version").unwrap(), Some("1.6.21".to_string()));
    assert_eq!(session.stat("no_such_stat").unwrap(), None);
}

#[test]
fn test_flush() {
    let server = FakeServer::start();
    let mut session = server.connect();

    session.set("a", "1").unwrap();
    session.set("b", "2").unwrap();

    assert!(session.flush().unwrap());
    assert_eq!(session.get("a").unwrap(), None);
    assert_eq!(session.stats().unwrap().get("curr_items"), Some("0"));
}

#[test]
fn test_flush_all_delay_on_the_wire() {
    let (mut session, handle) = scripted(b"OK\r\n");

    assert!(session.flush_all(30).unwrap());
    assert_eq!(handle.written_str(), "flush_all 30\r\n");
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_connect_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = Session::connect("127.0.0.1", port, Duration::from_millis(500)).unwrap_err();
    assert!(err.is_connection_failure());
}

#[test]
fn test_connect_unresolvable_host() {
    let err = Session::connect("no-such-host.invalid", 11211, Duration::from_millis(500))
        .unwrap_err();
    assert!(err.is_connection_failure());
}

#[test]
fn test_connect_with_invalid_config() {
    let config = Config::builder().host("").build();
    let err = Session::connect_with(&config).unwrap_err();
    assert!(matches!(err, MemcacheError::Config(_)));
}

#[test]
fn test_connect_with_config() {
    let server = FakeServer::start();
    let config = Config::builder()
        .host("127.0.0.1")
        .port(server.addr.port())
        .read_timeout_ms(2000)
        .build();

    let mut session = Session::connect_with(&config).unwrap();
    assert_eq!(session.host(), "127.0.0.1");
    assert_eq!(session.port(), server.addr.port());
    assert!(session.set("k", "v").unwrap());
}

#[test]
fn test_quit_closes_session() {
    let (mut session, handle) = scripted(b"");

    assert_eq!(session.state(), SessionState::Open);
    session.quit().unwrap();

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(handle.written_str(), "quit\r\n");
    assert!(handle.is_closed());
}

#[test]
fn test_operations_after_quit_fail() {
    let (mut session, handle) = scripted(b"STORED\r\n");
    session.quit().unwrap();

    let err = session.set("k", "v").unwrap_err();
    assert!(matches!(err, MemcacheError::SessionClosed));
    assert!(err.is_connection_failure());
    assert!(matches!(session.quit(), Err(MemcacheError::SessionClosed)));

    // nothing else went out
    assert_eq!(handle.written_str(), "quit\r\n");
}

#[test]
fn test_drop_quits_and_closes() {
    let (mut session, handle) = scripted(b"STORED\r\n");
    session.set("k", "v").unwrap();
    drop(session);

    assert_eq!(handle.written_str(), "set k 0 0 1\r\nv\r\nquit\r\n");
    assert!(handle.is_closed());
}

#[test]
fn test_drop_after_quit_sends_nothing_more() {
    let (mut session, handle) = scripted(b"");
    session.quit().unwrap();
    drop(session);

    assert_eq!(handle.written_str(), "quit\r\n");
}

// =============================================================================
// Failure Classification Tests
// =============================================================================

#[test]
fn test_eof_mid_reply_closes_session() {
    let (addr, commands) = serve_once(b"VALUE foo 0 10\r\nabc");
    let mut session = Session::connect("127.0.0.1", addr.port(), Duration::from_secs(2)).unwrap();

    let err = session.get("foo").unwrap_err();
    assert!(err.is_connection_failure());
    assert!(!err.is_protocol_fault());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(commands.recv().unwrap(), "get foo");

    assert!(matches!(session.get("foo"), Err(MemcacheError::SessionClosed)));
}

#[test]
fn test_server_hangup_before_reply() {
    let (addr, _commands) = serve_once(b"");
    let mut session = Session::connect("127.0.0.1", addr.port(), Duration::from_secs(2)).unwrap();

    let err = session.delete("foo").unwrap_err();
    assert!(matches!(err, MemcacheError::Connection(_)));
    assert!(!session.is_open());
}

#[test]
fn test_malformed_get_header_is_protocol_fault() {
    let (mut session, _handle) = scripted(b"HELLO WORLD\r\n");

    let err = session.get("foo").unwrap_err();
    assert!(err.is_protocol_fault());
    assert!(!err.is_connection_failure());
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_malformed_stats_line_closes_session() {
    let (mut session, handle) =
        scripted(b"STAT pid 1\r\nGARBAGE\r\nSTAT uptime 2\r\nEND\r\nSTORED\r\n");

    let err = session.stats().unwrap_err();
    assert!(err.is_protocol_fault());
    assert!(!session.is_open());
    assert!(handle.is_closed());

    // leftover STAT lines must never be read as the set reply
    assert!(matches!(session.set("k", "v"), Err(MemcacheError::SessionClosed)));
    assert_eq!(handle.written_str(), "stats\r\n");
}

#[test]
fn test_get_key_mismatch_closes_session() {
    let (mut session, handle) = scripted(b"VALUE other 0 3\r\nabc\r\nEND\r\nSTORED\r\n");

    let err = session.get("foo").unwrap_err();
    assert!(err.is_protocol_fault());
    assert_eq!(session.state(), SessionState::Closed);

    assert!(matches!(session.set("k", "v"), Err(MemcacheError::SessionClosed)));
    assert_eq!(handle.written_str(), "get foo\r\n");
}

#[test]
fn test_server_error_keeps_session_open() {
    let (mut session, _handle) = scripted(b"SERVER_ERROR out of memory\r\nSTORED\r\n");

    let err = session.set("k", "v").unwrap_err();
    assert!(matches!(err, MemcacheError::Server(_)));
    assert!(session.is_open());
    assert!(session.set("k", "v").unwrap());
}

#[test]
fn test_invalid_key_writes_nothing() {
    let (mut session, handle) = scripted(b"STORED\r\n");

    let err = session.set("bad key", "v").unwrap_err();
    assert!(matches!(err, MemcacheError::InvalidKey(_)));
    assert!(session.is_open());
    assert!(handle.written().is_empty());
}

#[test]
fn test_reply_eof_closes_transport() {
    let (mut session, handle) = scripted(b"");

    let err = session.get("k").unwrap_err();
    assert!(err.is_connection_failure());
    assert!(!session.is_open());
    assert!(handle.is_closed());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_mutex_serialized_sharing() {
    let server = FakeServer::start();
    let session = Arc::new(Mutex::new(server.connect()));
    session.lock().set("hits", "0").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                for _ in 0..25 {
                    session.lock().incr("hits", 1).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(session.lock().get("hits").unwrap(), Some(b"100".to_vec()));
}
