//! Application layer use cases for the sender.
//!
//! Use cases in this layer orchestrate `padrelay_core` types through traits
//! and contain no device access, socket I/O or file system access.
//!
//! # Sub-modules
//!
//! - **`transmit_state`** – The per-connection sampling/transmission loop:
//!   sample a snapshot every tick, encode it, and send it only when it
//!   differs from the last state sent.

pub mod transmit_state;
