//! Infrastructure layer for the receiver.
//!
//! Contains OS-facing adapters: input injection backends, the WebSocket
//! client, and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `padrelay_core`, but MUST NOT be imported by the `application` layer.

pub mod injection;
pub mod network;
pub mod storage;
