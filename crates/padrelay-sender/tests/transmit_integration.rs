//! Integration tests for the sender's WebSocket server.
//!
//! Each test binds the server to an ephemeral localhost port, drives it with
//! a scripted sampler, and connects a real WebSocket client.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use padrelay_core::{BitLayout, Frame, Snapshot};
use padrelay_sender::infrastructure::network::{serve, ServerConfig};
use padrelay_sender::infrastructure::sampler::{mock::ScriptedSamplerFactory, SamplerFactory};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const TICK: Duration = Duration::from_millis(5);
const READ_TIMEOUT: Duration = Duration::from_secs(5);

// ── Helpers ───────────────────────────────────────────────────────────────────

fn scenario(layout: &BitLayout) -> Vec<Snapshot> {
    [
        &[][..],
        &["left"][..],
        &["left", "down"][..],
        &["left", "down"][..],
        &["down"][..],
        &[][..],
    ]
    .iter()
    .map(|active| Snapshot::from_active(layout, active).expect("known signals"))
    .collect()
}

/// Starts the server on an ephemeral port and returns its ws:// URL.
async fn start_server(
    factory: Arc<dyn SamplerFactory>,
    running: Arc<AtomicBool>,
) -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let config = ServerConfig {
        bind_addr: addr,
        tick_interval: TICK,
        layout: BitLayout::default(),
    };
    let handle = tokio::spawn(serve(listener, config, factory, running));
    (format!("ws://{addr}"), handle)
}

/// Reads `count` text frames.
async fn read_texts<S>(ws: &mut S, count: usize) -> Vec<String>
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let mut texts = Vec::with_capacity(count);
    while texts.len() < count {
        let frame = timeout(READ_TIMEOUT, ws.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = frame {
            texts.push(text);
        }
    }
    texts
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_receiver_gets_hello_then_only_changed_states() {
    // Arrange
    let layout = BitLayout::default();
    let factory = Arc::new(ScriptedSamplerFactory::new(layout.clone(), scenario(&layout)));
    let running = Arc::new(AtomicBool::new(true));
    let (url, server) = start_server(Arc::clone(&factory) as Arc<dyn SamplerFactory>, Arc::clone(&running)).await;

    // Act
    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");
    let texts = read_texts(&mut ws, 5).await;

    // Assert
    match Frame::decode(&texts[0]).expect("hello decodes") {
        Frame::Hello(hello) => assert!(layout.matches(&hello.signals)),
        Frame::State(_) => panic!("first frame must be hello"),
    }
    assert_eq!(&texts[1..], &["1000", "1100", "0100", "0000"]);

    // Nothing else arrives while the sampler holds the idle state.
    let extra = timeout(TICK * 20, ws.next()).await;
    assert!(extra.is_err(), "idle ticks must not produce frames");

    ws.close(None).await.ok();
    running.store(false, Ordering::Relaxed);
    timeout(READ_TIMEOUT, server).await.expect("server stops").ok();
    assert_eq!(factory.opened(), 1);
}

#[tokio::test]
async fn test_each_connection_gets_its_own_encoder_and_sampler() {
    // Arrange
    let layout = BitLayout::default();
    let held_up = vec![Snapshot::from_active(&layout, &["up"]).unwrap()];
    let factory = Arc::new(ScriptedSamplerFactory::new(layout, held_up));
    let running = Arc::new(AtomicBool::new(true));
    let (url, _server) = start_server(Arc::clone(&factory) as Arc<dyn SamplerFactory>, Arc::clone(&running)).await;

    // Act
    let (mut first, _) = connect_async(url.as_str()).await.expect("connect first");
    let first_texts = read_texts(&mut first, 2).await;
    let (mut second, _) = connect_async(url.as_str()).await.expect("connect second");
    let second_texts = read_texts(&mut second, 2).await;

    // Assert: a late joiner still receives the full current state
    assert_eq!(first_texts[1], "0010");
    assert_eq!(second_texts[1], "0010");
    assert_eq!(factory.opened(), 2);

    running.store(false, Ordering::Relaxed);
}

#[tokio::test]
async fn test_clearing_running_flag_closes_sessions_and_stops_accepting() {
    // Arrange
    let layout = BitLayout::default();
    let factory = Arc::new(ScriptedSamplerFactory::new(layout, Vec::new()));
    let running = Arc::new(AtomicBool::new(true));
    let (url, server) = start_server(factory, Arc::clone(&running)).await;
    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");
    read_texts(&mut ws, 1).await;

    // Act
    running.store(false, Ordering::Relaxed);

    // Assert: the session closes the socket and the accept loop returns
    let closed = timeout(READ_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "session must end after shutdown");
    assert!(timeout(READ_TIMEOUT, server).await.is_ok());
}

#[tokio::test]
async fn test_serve_returns_only_after_every_session_has_closed() {
    // Arrange: two receivers connected to a sampler that never runs out
    let layout = BitLayout::default();
    let held_left = vec![Snapshot::from_active(&layout, &["left"]).unwrap()];
    let factory = Arc::new(ScriptedSamplerFactory::new(layout, held_left).looping());
    let running = Arc::new(AtomicBool::new(true));
    let (url, server) = start_server(Arc::clone(&factory) as Arc<dyn SamplerFactory>, Arc::clone(&running)).await;
    let (mut first, _) = connect_async(url.as_str()).await.expect("connect first");
    let (mut second, _) = connect_async(url.as_str()).await.expect("connect second");
    read_texts(&mut first, 2).await;
    read_texts(&mut second, 2).await;

    // Act
    running.store(false, Ordering::Relaxed);
    timeout(READ_TIMEOUT, server)
        .await
        .expect("serve returns")
        .expect("serve task does not panic");

    // Assert: both sockets were already closed when serve returned
    for ws in [&mut first, &mut second] {
        let ended = timeout(Duration::from_millis(100), async {
            loop {
                match ws.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(ended.is_ok(), "session still open after serve returned");
    }
    let samples = factory.sample_count();
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(factory.sample_count(), samples, "no sampler may run after serve returns");
}
