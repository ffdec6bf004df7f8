//! WebSocket client: connects to a sender and runs the decode loop.
//!
//! [`run_connection`] owns one connection from handshake to disconnect.  Text
//! frames are fed to the [`ReceiveStateUseCase`] in delivery order; nothing is
//! ever written back except the closing handshake.  Reconnecting is left to
//! the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, info, warn};

use crate::application::receive_state::{ReceiveError, ReceiveStateUseCase};

/// How often the read loop re-checks the shutdown flag while idle.
const READ_POLL: Duration = Duration::from_millis(200);

/// Errors that end a connection attempt or a running connection.
#[derive(Debug, Error)]
pub enum ClientNetworkError {
    /// The TCP connection or the WebSocket handshake failed.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: WsError,
    },

    /// The sender is not usable by this receiver.
    #[error(transparent)]
    Receive(#[from] ReceiveError),
}

/// How a connection ended without a protocol error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnected {
    /// The sender closed the socket or the stream ended.
    ClosedByPeer,
    /// The `running` flag was cleared.
    Shutdown,
    /// A read failed; the connection is unusable.
    TransportError(String),
}

/// Connects to `url` and processes frames until the connection ends.
///
/// Whatever ends the connection, [`ReceiveStateUseCase::on_disconnect`] runs
/// exactly once before this returns, so no injected key stays down.
///
/// # Errors
///
/// Returns [`ClientNetworkError::Connect`] if the sender cannot be reached and
/// [`ClientNetworkError::Receive`] if its Hello is rejected.
pub async fn run_connection(
    url: &str,
    use_case: &mut ReceiveStateUseCase,
    running: &AtomicBool,
) -> Result<Disconnected, ClientNetworkError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|source| ClientNetworkError::Connect {
            url: url.to_string(),
            source,
        })?;
    info!("connected to sender at {url}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let result = read_frames(&mut ws_rx, use_case, running).await;
    use_case.on_disconnect();

    let (applied, dropped) = use_case.frame_counts();
    debug!("{applied} state frames applied, {dropped} dropped");

    match &result {
        Ok(Disconnected::ClosedByPeer) | Ok(Disconnected::TransportError(_)) => {}
        // Our side is ending the connection: send the closing handshake.
        Ok(Disconnected::Shutdown) | Err(_) => {
            let _ = ws_tx.close().await;
        }
    }

    match &result {
        Ok(reason) => info!("disconnected from {url}: {reason:?}"),
        Err(e) => warn!("disconnected from {url}: {e}"),
    }
    result
}

/// Feeds inbound frames to the use case until the stream ends, a read fails,
/// a Hello is rejected, or `running` is cleared.
async fn read_frames<S>(
    rx: &mut S,
    use_case: &mut ReceiveStateUseCase,
    running: &AtomicBool,
) -> Result<Disconnected, ClientNetworkError>
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    loop {
        if !running.load(Ordering::Relaxed) {
            debug!("shutdown flag set; leaving read loop");
            return Ok(Disconnected::Shutdown);
        }

        let message = match timeout(READ_POLL, rx.next()).await {
            Err(_) => continue,
            Ok(None) => return Ok(Disconnected::ClosedByPeer),
            Ok(Some(Err(e))) => return Ok(Disconnected::TransportError(e.to_string())),
            Ok(Some(Ok(message))) => message,
        };

        match message {
            WsMessage::Text(text) => {
                use_case.handle_text(&text)?;
            }
            WsMessage::Binary(bytes) => {
                warn!("ignoring {} byte binary frame", bytes.len());
            }
            WsMessage::Close(frame) => {
                debug!("Close frame received: {frame:?}");
                return Ok(Disconnected::ClosedByPeer);
            }
            // Pings are answered by tungstenite itself.
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }
}
