//! Integration tests for the receiver's WebSocket client.
//!
//! Each test runs a throwaway WebSocket server on an ephemeral localhost port
//! that plays a fixed list of text frames, then connects the real client with
//! a recording injector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use padrelay_core::{BitLayout, Frame, HelloFrame};
use padrelay_receiver::application::receive_state::{ReceiveError, ReceiveStateUseCase};
use padrelay_receiver::infrastructure::injection::mock::{EventLog, RecordingInjector};
use padrelay_receiver::infrastructure::network::{
    run_connection, ClientNetworkError, Disconnected,
};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

// ── Helpers ───────────────────────────────────────────────────────────────────

fn hello(names: &[&str]) -> String {
    let layout = BitLayout::new(names.iter().copied()).expect("valid layout");
    Frame::Hello(HelloFrame::for_layout(&layout)).encode()
}

/// What the fake sender does after playing its frames.
#[derive(Clone, Copy)]
enum Then {
    Close,
    Hold,
}

/// Serves one connection that sends `frames` and then closes or holds the
/// socket open.  Returns the ws:// URL.
async fn fake_sender(frames: Vec<String>, then: Then) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        for frame in frames {
            ws.send(Message::Text(frame)).await.expect("send");
        }
        match then {
            Then::Close => {
                ws.close(None).await.ok();
            }
            Then::Hold => while let Some(Ok(_)) = ws.next().await {},
        }
    });
    format!("ws://{addr}")
}

fn recording_use_case() -> (ReceiveStateUseCase, EventLog) {
    let injector = RecordingInjector::new();
    let log = injector.log();
    (
        ReceiveStateUseCase::new(BitLayout::default(), Box::new(injector)),
        log,
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_frames_become_ordered_press_and_release_events() {
    // Arrange
    let frames = vec![
        hello(&["left", "down", "up", "right"]),
        "1000".to_string(),
        "1100".to_string(),
        "1100".to_string(),
        "0100".to_string(),
        "0000".to_string(),
    ];
    let url = fake_sender(frames, Then::Close).await;
    let (mut use_case, log) = recording_use_case();
    let running = AtomicBool::new(true);

    // Act
    let outcome = timeout(TEST_TIMEOUT, run_connection(&url, &mut use_case, &running))
        .await
        .expect("connection ends");

    // Assert
    assert_eq!(outcome.unwrap(), Disconnected::ClosedByPeer);
    assert_eq!(
        log.rendered(),
        vec![
            "left:pressed",
            "down:pressed",
            "left:released",
            "down:released"
        ]
    );
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    let frames = vec![
        "0010".to_string(),
        "0x10".to_string(),
        "001".to_string(),
        "0000".to_string(),
    ];
    let url = fake_sender(frames, Then::Close).await;
    let (mut use_case, log) = recording_use_case();
    let running = AtomicBool::new(true);

    let outcome = timeout(TEST_TIMEOUT, run_connection(&url, &mut use_case, &running))
        .await
        .expect("connection ends");

    assert!(outcome.is_ok());
    assert_eq!(log.rendered(), vec!["up:pressed", "up:released"]);
    assert_eq!(use_case.frame_counts(), (2, 2));
}

#[tokio::test]
async fn test_held_signals_are_released_when_sender_disconnects() {
    // Arrange: the sender goes away while "right" and "up" are held
    let url = fake_sender(vec!["0011".to_string()], Then::Close).await;
    let (mut use_case, log) = recording_use_case();
    let running = AtomicBool::new(true);

    // Act
    timeout(TEST_TIMEOUT, run_connection(&url, &mut use_case, &running))
        .await
        .expect("connection ends")
        .expect("clean disconnect");

    // Assert
    assert_eq!(
        log.rendered(),
        vec!["up:pressed", "right:pressed", "up:released", "right:released"]
    );
    assert!(use_case.held().is_empty());
}

#[tokio::test]
async fn test_layout_mismatch_ends_connection_with_error() {
    let frames = vec![hello(&["a", "b", "c", "d"]), "1111".to_string()];
    let url = fake_sender(frames, Then::Hold).await;
    let (mut use_case, log) = recording_use_case();
    let running = AtomicBool::new(true);

    let outcome = timeout(TEST_TIMEOUT, run_connection(&url, &mut use_case, &running))
        .await
        .expect("connection ends");

    assert!(matches!(
        outcome,
        Err(ClientNetworkError::Receive(ReceiveError::LayoutMismatch { .. }))
    ));
    assert!(log.events().is_empty(), "nothing may be injected after a mismatch");
}

#[tokio::test]
async fn test_shutdown_flag_releases_and_returns() {
    // Arrange
    let url = fake_sender(vec!["1000".to_string()], Then::Hold).await;
    let (mut use_case, log) = recording_use_case();
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        flag.store(false, Ordering::Relaxed);
    });

    // Act
    let outcome = timeout(TEST_TIMEOUT, run_connection(&url, &mut use_case, &running))
        .await
        .expect("connection ends");

    // Assert
    assert_eq!(outcome.unwrap(), Disconnected::Shutdown);
    assert_eq!(log.rendered(), vec!["left:pressed", "left:released"]);
}

#[tokio::test]
async fn test_unreachable_sender_is_a_connect_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("local addr").port()
    };
    let (mut use_case, _log) = recording_use_case();
    let running = AtomicBool::new(true);

    let outcome = run_connection(&format!("ws://127.0.0.1:{port}"), &mut use_case, &running).await;

    assert!(matches!(outcome, Err(ClientNetworkError::Connect { .. })));
}
