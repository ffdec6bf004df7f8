//! ReceiveStateUseCase: the receive/decode loop body.
//!
//! The network layer hands every inbound text frame to
//! [`ReceiveStateUseCase::handle_text`] in delivery order.  Hello frames are
//! checked against the locally configured layout; state frames go through the
//! connection's [`StateDecoder`] and each resulting press or release is passed
//! to the [`InputInjector`].
//!
//! The use case is the single owner of the decoder state.  It is created per
//! connection and nothing else mutates it.

use padrelay_core::{
    BitLayout, Frame, FrameError, HelloFrame, KeyCode, Signal, SignalEvent, StateDecoder,
    Transition, WireState,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Characters of a dropped frame that make it into the log.
const LOG_PREVIEW_CHARS: usize = 64;

/// Error type for injector backends.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The signal has no key bound in the configuration.
    #[error("no key bound to signal {0:?}")]
    UnboundSignal(String),

    /// Two signals share one key, so one could release it while the other
    /// still holds it.
    #[error("signals {first:?} and {second:?} are both bound to {key}")]
    DuplicateKey {
        key: KeyCode,
        first: String,
        second: String,
    },

    /// An OS-level call failed.
    #[error("platform error: {0}")]
    Platform(String),

    /// No keyboard backend exists for this platform.
    #[error("key injection is not supported on this platform")]
    Unsupported,
}

/// Errors that end a connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReceiveError {
    /// The sender announced a different signal layout.
    #[error("sender layout [{}] does not match local layout [{}]", .remote.join(", "), .local.join(", "))]
    LayoutMismatch { local: Vec<String>, remote: Vec<String> },

    /// The sender speaks a protocol version this receiver does not.
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),
}

/// Performs the OS-level key press or release for one decoded event.
///
/// Called exactly once per transition: a signal is never pressed twice
/// without a release in between.
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send {
    fn apply(&mut self, signal: &Signal, transition: Transition) -> Result<(), InjectionError>;
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A Hello whose layout matches ours.
    LayoutConfirmed,
    /// A state frame; holds the events it produced, in bit order.
    Applied(Vec<SignalEvent>),
    /// A malformed frame, discarded without touching the decoder.
    Dropped,
}

/// Per-connection receive state.
pub struct ReceiveStateUseCase {
    decoder: StateDecoder,
    injector: Box<dyn InputInjector>,
    hello_seen: bool,
    frames_applied: u64,
    frames_dropped: u64,
}

impl ReceiveStateUseCase {
    pub fn new(layout: BitLayout, injector: Box<dyn InputInjector>) -> Self {
        Self {
            decoder: StateDecoder::new(layout),
            injector,
            hello_seen: false,
            frames_applied: 0,
            frames_dropped: 0,
        }
    }

    pub fn layout(&self) -> &BitLayout {
        self.decoder.layout()
    }

    /// Signals currently held down on this machine.
    pub fn held(&self) -> Vec<Signal> {
        self.decoder.held().cloned().collect()
    }

    /// `(applied, dropped)` state frame counts for this connection.
    pub fn frame_counts(&self) -> (u64, u64) {
        (self.frames_applied, self.frames_dropped)
    }

    /// Processes one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError`] only for a Hello that makes the connection
    /// unusable.  Malformed state frames are dropped and reported as
    /// [`FrameOutcome::Dropped`].
    pub fn handle_text(&mut self, text: &str) -> Result<FrameOutcome, ReceiveError> {
        match Frame::decode(text) {
            Ok(Frame::Hello(hello)) => self.on_hello(&hello),
            Ok(Frame::State(state)) => Ok(self.on_state(&state)),
            Err(FrameError::UnsupportedVersion(version)) => {
                Err(ReceiveError::UnsupportedVersion(version))
            }
            Err(e) => {
                warn!("dropping frame {}: {e}", preview(text));
                self.frames_dropped += 1;
                Ok(FrameOutcome::Dropped)
            }
        }
    }

    /// Releases every held signal and resets the decoder.
    ///
    /// Call once when the connection ends, for whatever reason.
    pub fn on_disconnect(&mut self) -> Vec<SignalEvent> {
        let events = self.decoder.release_all();
        if !events.is_empty() {
            info!("connection lost; releasing {} held signal(s)", events.len());
        }
        self.inject(&events);
        self.hello_seen = false;
        events
    }

    fn on_hello(&mut self, hello: &HelloFrame) -> Result<FrameOutcome, ReceiveError> {
        let layout = self.decoder.layout();
        if !layout.matches(&hello.signals) {
            return Err(ReceiveError::LayoutMismatch {
                local: layout.names(),
                remote: hello.signals.clone(),
            });
        }
        if self.hello_seen {
            debug!("repeated hello frame");
        }
        self.hello_seen = true;
        info!("sender layout confirmed: [{}]", hello.signals.join(", "));
        Ok(FrameOutcome::LayoutConfirmed)
    }

    fn on_state(&mut self, state: &WireState) -> FrameOutcome {
        if !self.hello_seen && self.frames_applied == 0 {
            debug!("state frame before hello; decoding with the local layout");
        }
        match self.decoder.apply(state) {
            Ok(events) => {
                self.frames_applied += 1;
                self.inject(&events);
                FrameOutcome::Applied(events)
            }
            Err(e) => {
                warn!("dropping state frame {state}: {e}");
                self.frames_dropped += 1;
                FrameOutcome::Dropped
            }
        }
    }

    fn inject(&mut self, events: &[SignalEvent]) {
        for event in events {
            if let Err(e) = self.injector.apply(&event.signal, event.transition) {
                warn!("failed to inject {event}: {e}");
            }
        }
    }
}

/// Quoted start of `text`, with the total size when it was cut.
fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{:?}... ({} bytes)", &text[..cut], text.len()),
        None => format!("{text:?}"),
    }
}
