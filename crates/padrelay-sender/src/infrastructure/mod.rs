//! Infrastructure layer for the sender.
//!
//! Contains OS-facing adapters: input device samplers, the WebSocket server,
//! and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `padrelay_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod sampler;
pub mod storage;
