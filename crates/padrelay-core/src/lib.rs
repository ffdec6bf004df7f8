//! # padrelay-core
//!
//! Shared library for padrelay containing the bit layout, the edge-triggered
//! state encoder and decoder, the text frame codec, and the key identifiers
//! used by the receiver's key mapping.
//!
//! This crate is used by both the sender and the receiver applications.
//! It never touches input devices or network sockets; the only OS access is
//! reading the shared config file.
//!
//! # Architecture overview
//!
//! padrelay relays the pressed/released state of a handful of buttons from
//! one machine to another.  The sender samples the device once per tick and
//! the receiver replays every change as a synthetic key press or release.
//!
//! - **`domain`** – Plain values: the ordered [`BitLayout`] of signals, the
//!   per-tick [`Snapshot`], and the [`DeviceInfo`] record.
//!
//! - **`protocol`** – The [`WireState`] bitstring, the [`StateEncoder`] that
//!   only emits a message when the state changed, the [`StateDecoder`] that
//!   turns consecutive full states into press/release events, and the
//!   [`Frame`] codec used on the WebSocket.
//!
//! - **`keymap`** – [`KeyCode`], the physical keys a signal can be bound to
//!   on the receiving side, with translations to OS-native key codes.
//!
//! - **`config`** – Location and loading of the TOML file both binaries read.

pub mod config;
pub mod domain;
pub mod keymap;
pub mod protocol;

pub use config::ConfigError;
pub use domain::device::DeviceInfo;
pub use domain::layout::{BitLayout, LayoutError, Signal};
pub use domain::snapshot::Snapshot;
pub use keymap::{KeyCode, UnknownKey};
pub use protocol::decoder::{DecodeError, SignalEvent, StateDecoder, Transition};
pub use protocol::encoder::{EncodeError, StateEncoder};
pub use protocol::frame::{Frame, FrameError, HelloFrame, PROTOCOL_VERSION};
pub use protocol::wire::{WireError, WireState};
