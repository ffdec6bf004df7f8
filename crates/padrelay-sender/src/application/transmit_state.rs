//! TransmitStateUseCase: the sampling/transmission loop.
//!
//! Once per tick the use case asks a [`StateSampler`] for a snapshot, runs it
//! through the connection's [`StateEncoder`], and hands any resulting wire
//! state to a [`StateSink`].  Unchanged ticks produce no traffic.
//!
//! # Architecture
//!
//! The use case depends only on the two traits below and on `padrelay_core`.
//! The evdev sampler and the WebSocket sink are injected by the
//! infrastructure layer; tests inject a scripted sampler and a recording sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use padrelay_core::{BitLayout, EncodeError, Snapshot, StateEncoder, WireState};
use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Error type for sampler backends.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("no input device at index {index} ({available} available)")]
    InvalidDeviceIndex { index: usize, available: usize },

    #[error("signal {0:?} has no button code configured")]
    UnmappedSignal(String),

    #[error("input device I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device sampling is not supported on this platform")]
    Unsupported,
}

/// Error type for the transmit-state use case.
#[derive(Debug, Error)]
pub enum TransmitError {
    /// The sampler could not read the device.
    #[error("sampler failed: {0}")]
    Sample(#[from] SampleError),

    /// The sampler produced a snapshot that does not match the layout.
    #[error("malformed snapshot: {0}")]
    Encode(#[from] EncodeError),

    /// The transport rejected a message.
    #[error("sink failed: {0}")]
    Sink(String),
}

/// Produces one [`Snapshot`] of every configured signal per call.
pub trait StateSampler: Send {
    fn sample(&mut self) -> Result<Snapshot, SampleError>;
}

/// Delivers wire states to the remote side.
///
/// The WebSocket implementation awaits until the frame is written, which is
/// where transport backpressure suspends the loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateSink: Send {
    async fn send_state(&mut self, state: &WireState) -> Result<(), String>;
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub ticks: u64,
    pub messages_sent: u64,
}

/// Per-connection transmission state.
pub struct TransmitStateUseCase {
    encoder: StateEncoder,
    ticks: u64,
    messages_sent: u64,
}

impl TransmitStateUseCase {
    pub fn new(layout: BitLayout) -> Self {
        Self {
            encoder: StateEncoder::new(layout),
            ticks: 0,
            messages_sent: 0,
        }
    }

    /// Processes one sampled snapshot.
    ///
    /// Returns the wire state to transmit, or `None` when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::Encode`] for a snapshot that does not match
    /// the layout.
    pub fn on_tick(&mut self, snapshot: &Snapshot) -> Result<Option<WireState>, TransmitError> {
        self.ticks += 1;
        Ok(self.encoder.encode(snapshot)?)
    }

    /// Runs the fixed-interval loop until `running` is cleared or an error
    /// ends the session.
    ///
    /// The first tick fires immediately.  A late tick is not made up for with
    /// a burst; the schedule is pushed back instead.
    ///
    /// # Errors
    ///
    /// Any sampler, encoder or sink failure ends the loop and is returned.
    pub async fn run<S, K>(
        &mut self,
        sampler: &mut S,
        sink: &mut K,
        tick_interval: Duration,
        running: &AtomicBool,
    ) -> Result<SessionSummary, TransmitError>
    where
        S: StateSampler + ?Sized,
        K: StateSink + ?Sized,
    {
        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !running.load(Ordering::Relaxed) {
                debug!("shutdown flag set; leaving transmit loop");
                break;
            }

            let snapshot = sampler.sample()?;
            if let Some(state) = self.on_tick(&snapshot)? {
                sink.send_state(&state).await.map_err(TransmitError::Sink)?;
                self.messages_sent += 1;
            }
        }

        Ok(self.summary())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            ticks: self.ticks,
            messages_sent: self.messages_sent,
        }
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }
}
