//! Protocol module: the wire state, its encoder and decoder, and the frame codec.
//!
//! Data flows one way:
//!
//! ```text
//! Snapshot ─► StateEncoder ─► WireState ─► Frame (text) ═══► Frame ─► StateDecoder ─► SignalEvent*
//! ```

pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod wire;

pub use decoder::{DecodeError, SignalEvent, StateDecoder, Transition};
pub use encoder::{EncodeError, StateEncoder};
pub use frame::{Frame, FrameError, HelloFrame, PROTOCOL_VERSION};
pub use wire::{WireError, WireState};
