//! Application layer use cases for the receiver.
//!
//! # Sub-modules
//!
//! - **`receive_state`** – The per-connection receive/decode loop body:
//!   decode each text frame, turn consecutive full states into press/release
//!   events, and hand every event to an [`InputInjector`](receive_state::InputInjector).

pub mod receive_state;
