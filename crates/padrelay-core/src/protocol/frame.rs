//! Text frame codec for the WebSocket transport.
//!
//! Every WebSocket text frame carries exactly one [`Frame`]:
//!
//! ```text
//! {"version":1,"signals":["left","down","up","right"]}   Hello, once, first
//! 1000                                                   State
//! 1100                                                   State
//! ```
//!
//! A frame starting with `{` is a Hello; anything else must be a wire state.
//! There are no sequence numbers, acknowledgements or heartbeats: the
//! transport already delivers whole messages in order, and every state frame
//! is a complete state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::wire::{WireError, WireState};
use crate::domain::layout::BitLayout;

/// Version announced in the Hello frame.
pub const PROTOCOL_VERSION: u8 = 1;

/// Errors that can occur while decoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The Hello frame was not valid JSON of the expected shape.
    #[error("malformed hello frame: {0}")]
    MalformedHello(String),

    /// The Hello frame announced a protocol version we do not speak.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The state frame was not a valid wire state.
    #[error("malformed state frame: {0}")]
    MalformedState(#[from] WireError),
}

/// Layout announcement sent by the sender when a connection opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloFrame {
    pub version: u8,
    pub signals: Vec<String>,
}

impl HelloFrame {
    pub fn for_layout(layout: &BitLayout) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            signals: layout.names(),
        }
    }
}

/// A decoded WebSocket text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Hello(HelloFrame),
    State(WireState),
}

impl Frame {
    /// Renders the frame as WebSocket text.
    pub fn encode(&self) -> String {
        match self {
            Frame::Hello(hello) => {
                // A struct of a u8 and a Vec<String> always serializes.
                serde_json::to_string(hello).unwrap_or_default()
            }
            Frame::State(state) => state.to_string(),
        }
    }

    /// Parses WebSocket text into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] if the text is neither a well-formed Hello of a
    /// supported version nor a well-formed wire state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use padrelay_core::Frame;
    ///
    /// match Frame::decode("0110").unwrap() {
    ///     Frame::State(state) => assert_eq!(state.len(), 4),
    ///     Frame::Hello(_) => unreachable!(),
    /// }
    /// ```
    pub fn decode(text: &str) -> Result<Frame, FrameError> {
        if text.starts_with('{') {
            let hello: HelloFrame = serde_json::from_str(text)
                .map_err(|e| FrameError::MalformedHello(e.to_string()))?;
            if hello.version != PROTOCOL_VERSION {
                return Err(FrameError::UnsupportedVersion(hello.version));
            }
            return Ok(Frame::Hello(hello));
        }
        Ok(Frame::State(text.parse()?))
    }
}
