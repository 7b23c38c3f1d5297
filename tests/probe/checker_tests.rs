#![cfg(feature = "network-monitoring")]

use analytic_probe::core::probe::{
    check_status, check_status_with_options, DebugLogger, ProbeOptions, ServerEndpoint,
    ServerStatus, StatusProbe, StatusResult, ZmqTransport, DEFAULT_OPERATION,
};
use std::net::TcpListener;
use std::time::{Duration, Instant};

use crate::common::{unused_port, PeerBehavior, RepPeer, SUCCESS_REPLY};

fn quick_options() -> ProbeOptions {
    ProbeOptions::with_timeouts(500, 500)
}

#[test]
fn test_running_server_reports_pid() {
    let peer = RepPeer::spawn(PeerBehavior::Reply(SUCCESS_REPLY.as_bytes().to_vec()));

    let result = check_status(&peer.endpoint(), DEFAULT_OPERATION);

    assert_eq!(result.status(), ServerStatus::Running);
    assert_eq!(result.pid(), 27234);
    assert_eq!(peer.requests().len(), 1);
}

#[test]
fn test_request_carries_operation_name() {
    let peer = RepPeer::spawn(PeerBehavior::Reply(SUCCESS_REPLY.as_bytes().to_vec()));

    check_status_with_options(&peer.endpoint(), "CustomStatus", &quick_options());

    let requests = peer.requests();
    let request = String::from_utf8(requests[0].clone()).unwrap();
    assert!(request.contains("<operation>CustomStatus</operation>"));
}

#[test]
fn test_no_listener_is_unknown() {
    let endpoint = ServerEndpoint::new("127.0.0.1", unused_port());

    let started = Instant::now();
    let result = check_status_with_options(&endpoint, DEFAULT_OPERATION, &quick_options());

    assert_eq!(result, StatusResult::unknown());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_listener_without_handshake_is_unknown() {
    // Accepts TCP connections but never speaks ZMTP
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = ServerEndpoint::new("127.0.0.1", listener.local_addr().unwrap().port());

    let result = check_status_with_options(&endpoint, DEFAULT_OPERATION, &quick_options());

    assert_eq!(result, StatusResult::unknown());
    drop(listener);
}

#[test]
fn test_silent_server_is_unknown_after_receive_timeout() {
    let peer = RepPeer::spawn(PeerBehavior::Silent);
    let options = ProbeOptions::with_timeouts(1_000, 600);

    let started = Instant::now();
    let result = check_status_with_options(&peer.endpoint(), DEFAULT_OPERATION, &options);
    let elapsed = started.elapsed();

    assert_eq!(result, StatusResult::unknown());
    assert!(elapsed >= Duration::from_millis(600));
    assert!(elapsed < Duration::from_secs(5));
}

#[test]
fn test_silent_server_with_default_timeouts() {
    let peer = RepPeer::spawn(PeerBehavior::Silent);

    let started = Instant::now();
    let result = check_status(&peer.endpoint(), DEFAULT_OPERATION);
    let elapsed = started.elapsed();

    assert_eq!(result, StatusResult::unknown());
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed < Duration::from_secs(25));
}

#[test]
fn test_garbage_reply_is_unknown() {
    let peer = RepPeer::spawn(PeerBehavior::Reply(b"not xml at all".to_vec()));
    let result = check_status_with_options(&peer.endpoint(), DEFAULT_OPERATION, &quick_options());
    assert_eq!(result, StatusResult::unknown());
}

#[test]
fn test_stopped_server_is_unknown() {
    let reply = r#"<?xml version="1.0" encoding="utf-8"?><analyticreply><operation>analyticserverstatus</operation><status>Stopped</status><pid>27234</pid></analyticreply>"#;
    let peer = RepPeer::spawn(PeerBehavior::Reply(reply.as_bytes().to_vec()));
    let result = check_status_with_options(&peer.endpoint(), DEFAULT_OPERATION, &quick_options());
    assert_eq!(result, StatusResult::unknown());
}

#[test]
fn test_repeated_probes_agree() {
    let peer = RepPeer::spawn(PeerBehavior::Reply(SUCCESS_REPLY.as_bytes().to_vec()));

    let results: Vec<_> = (0..5)
        .map(|_| check_status_with_options(&peer.endpoint(), DEFAULT_OPERATION, &quick_options()))
        .collect();

    assert!(results.iter().all(|r| *r == StatusResult::running(27234)));
    assert_eq!(peer.requests().len(), 5);
}

#[tokio::test]
async fn test_async_probe_over_zmq_transport() {
    let peer = RepPeer::spawn(PeerBehavior::Reply(SUCCESS_REPLY.as_bytes().to_vec()));
    let probe = StatusProbe::with_transport(
        Box::new(ZmqTransport::new(quick_options())),
        DebugLogger::silent(),
        quick_options(),
    );

    let result = probe.check_status(&peer.endpoint(), DEFAULT_OPERATION).await;

    assert_eq!(result, StatusResult::running(27234));
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"status":"Running","pid":27234}"#
    );
}
