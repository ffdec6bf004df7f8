//! Network infrastructure for the sender.
//!
//! - **`ws_server`** – WebSocket accept loop; one session task per connected
//!   receiver, each with its own sampler and encoder.

pub mod ws_server;

pub use ws_server::{run_server, serve, ServerConfig, WsStateSink};
