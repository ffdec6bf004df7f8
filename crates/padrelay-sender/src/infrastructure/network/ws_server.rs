//! WebSocket server: accept loop and per-session task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Upgrading each accepted connection to a WebSocket session.
//! 3. Sending the Hello frame that announces the signal layout.
//! 4. Running the transmit loop for that session with its own sampler and
//!    encoder, while draining inbound frames to notice a Close.
//! 5. Stopping when the `running` flag is cleared, and waiting for every
//!    session to close its socket before returning.
//!
//! Each session runs in its own Tokio task inside a [`JoinSet`].  Sessions
//! share nothing but the sampler factory, so a slow receiver never delays
//! another one.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use padrelay_core::{BitLayout, Frame, HelloFrame, WireState};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::transmit_state::{StateSink, TransmitError, TransmitStateUseCase};
use crate::infrastructure::sampler::SamplerFactory;

/// How often the accept loop re-checks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// How long shutdown waits for sessions to close before aborting them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Settings shared by every session.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub tick_interval: Duration,
    pub layout: BitLayout,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(
    config: ServerConfig,
    factory: Arc<dyn SamplerFactory>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    info!("WebSocket server listening on ws://{}", config.bind_addr);
    serve(listener, config, factory, running).await;
    Ok(())
}

/// Runs the accept loop on an already bound listener.
///
/// Returns after `running` is cleared and every session task has finished.
/// Sessions still open after [`SHUTDOWN_GRACE`] are aborted.
pub async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    factory: Arc<dyn SamplerFactory>,
    running: Arc<AtomicBool>,
) {
    let config = Arc::new(config);
    let mut sessions = JoinSet::new();

    loop {
        // Reap finished sessions.
        while sessions.try_join_next().is_some() {}

        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let session_id = Uuid::new_v4();
                info!("session {session_id}: receiver connected from {peer_addr}");
                let cfg = Arc::clone(&config);
                let factory = Arc::clone(&factory);
                let running = Arc::clone(&running);
                sessions.spawn(handle_session(
                    stream, peer_addr, session_id, cfg, factory, running,
                ));
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    drop(listener);
    if !sessions.is_empty() {
        debug!("waiting for {} session(s) to close", sessions.len());
    }
    let drained = timeout(SHUTDOWN_GRACE, async {
        while sessions.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(
            "aborting {} session(s) still open after {:?}",
            sessions.len(),
            SHUTDOWN_GRACE
        );
        sessions.shutdown().await;
    }
}

// ── WebSocket sink ────────────────────────────────────────────────────────────

/// [`StateSink`] writing state frames to a WebSocket.
pub struct WsStateSink<S> {
    inner: S,
}

impl<S> WsStateSink<S>
where
    S: Sink<WsMessage, Error = WsError> + Unpin + Send,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Announces the signal layout; must be the first frame of a session.
    pub async fn send_hello(&mut self, layout: &BitLayout) -> Result<(), WsError> {
        let hello = Frame::Hello(HelloFrame::for_layout(layout)).encode();
        self.inner.send(WsMessage::Text(hello)).await
    }

    pub async fn close(&mut self) {
        let _ = self.inner.close().await;
    }
}

#[async_trait]
impl<S> StateSink for WsStateSink<S>
where
    S: Sink<WsMessage, Error = WsError> + Unpin + Send,
{
    async fn send_state(&mut self, state: &WireState) -> Result<(), String> {
        let text = Frame::State(state.clone()).encode();
        self.inner
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| e.to_string())
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    session_id: Uuid,
    config: Arc<ServerConfig>,
    factory: Arc<dyn SamplerFactory>,
    running: Arc<AtomicBool>,
) {
    match run_session(stream, session_id, config, factory, running).await {
        Ok(()) => info!("session {session_id}: receiver {peer_addr} disconnected"),
        Err(e) => warn!("session {session_id}: receiver {peer_addr} disconnected: {e:#}"),
    }
}

/// Runs one receiver session from handshake to disconnect.
///
/// The session ends at the first of: the transmit loop returning (shutdown
/// or an error), or the peer closing the socket.  The sampler and the socket
/// are dropped on return.
async fn run_session(
    stream: TcpStream,
    session_id: Uuid,
    config: Arc<ServerConfig>,
    factory: Arc<dyn SamplerFactory>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .context("WebSocket handshake failed")?;
    let (ws_tx, mut ws_rx) = ws_stream.split();
    let mut sink = WsStateSink::new(ws_tx);

    let mut sampler = match factory.open() {
        Ok(sampler) => sampler,
        Err(e) => {
            sink.close().await;
            return Err(e).context("failed to open input sampler");
        }
    };

    sink.send_hello(&config.layout)
        .await
        .context("failed to send hello frame")?;

    let mut use_case = TransmitStateUseCase::new(config.layout.clone());
    let outcome: Option<Result<_, TransmitError>> = tokio::select! {
        result = use_case.run(sampler.as_mut(), &mut sink, config.tick_interval, &running) => Some(result),
        () = drain_inbound(&mut ws_rx, session_id) => None,
    };

    let summary = use_case.summary();
    debug!(
        "session {session_id}: {} ticks, {} messages sent",
        summary.ticks, summary.messages_sent
    );

    match outcome {
        Some(Ok(_)) => {
            sink.close().await;
            Ok(())
        }
        Some(Err(e)) => {
            sink.close().await;
            Err(e).context("transmit loop failed")
        }
        None => Ok(()),
    }
}

/// Reads and discards inbound frames until the peer closes or errors.
///
/// There is no backchannel; this only exists to notice a disconnect.
async fn drain_inbound<S>(rx: &mut S, session_id: Uuid)
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    while let Some(message) = rx.next().await {
        match message {
            Ok(WsMessage::Close(_)) => {
                debug!("session {session_id}: Close frame received");
                return;
            }
            Ok(other) => debug!("session {session_id}: ignoring inbound {} byte frame", other.len()),
            Err(e) => {
                debug!("session {session_id}: read error: {e}");
                return;
            }
        }
    }
    debug!("session {session_id}: stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::sink::drain;

    #[tokio::test]
    async fn test_ws_state_sink_accepts_state_frames() {
        // Arrange
        let mut sink = WsStateSink::new(drain().sink_map_err(|_| WsError::ConnectionClosed));

        // Act
        let result = sink.send_state(&"1010".parse().unwrap()).await;

        // Assert
        tokio_test::assert_ok!(result);
    }

    #[tokio::test]
    async fn test_drain_inbound_stops_at_close_frame() {
        // Arrange
        let frames = vec![
            Ok(WsMessage::Text("ignored".into())),
            Ok(WsMessage::Close(None)),
            Ok(WsMessage::Text("never read".into())),
        ];
        let mut rx = futures_util::stream::iter(frames);

        // Act
        drain_inbound(&mut rx, Uuid::nil()).await;

        // Assert
        assert!(matches!(rx.next().await, Some(Ok(WsMessage::Text(t))) if t == "never read"));
    }
}
