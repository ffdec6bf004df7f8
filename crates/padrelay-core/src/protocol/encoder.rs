//! Edge-triggered state encoder.
//!
//! The encoder turns every snapshot into a [`WireState`] and compares it with
//! the last state it *handed out for sending*.  Only a different state
//! produces a message, and that message always carries the full state rather
//! than a delta, so a receiver that just (re)connected recovers everything
//! from the next message it gets.
//!
//! The comparison baseline starts as all zeros.  An idle device therefore
//! never produces traffic, and the first message appears the moment anything
//! becomes active.

use thiserror::Error;
use tracing::trace;

use super::wire::WireState;
use crate::domain::layout::BitLayout;
use crate::domain::snapshot::Snapshot;

/// The sampler handed over a snapshot that does not line up with the layout.
///
/// This is an integration bug, not a runtime condition: the owner of the
/// encoder should abort the session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("snapshot has {got} signals, layout has {expected}")]
    SignalCountMismatch { expected: usize, got: usize },

    #[error("snapshot signal at position {position} is {got:?}, layout expects {expected:?}")]
    SignalMismatch {
        position: usize,
        expected: String,
        got: String,
    },
}

/// Converts snapshots into wire states, suppressing unchanged ones.
#[derive(Debug, Clone)]
pub struct StateEncoder {
    layout: BitLayout,
    last_sent: WireState,
}

impl StateEncoder {
    pub fn new(layout: BitLayout) -> Self {
        let last_sent = WireState::zeroed(layout.len());
        Self { layout, last_sent }
    }

    /// Encodes `snapshot` and returns the wire state to transmit, or `None`
    /// when it equals the previously returned one.
    ///
    /// A returned state becomes the new baseline immediately.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the snapshot does not contain exactly the
    /// layout's signals in the layout's order.  The baseline is left as is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use padrelay_core::{BitLayout, Snapshot, StateEncoder};
    ///
    /// let layout = BitLayout::default();
    /// let mut encoder = StateEncoder::new(layout.clone());
    ///
    /// let up = Snapshot::from_active(&layout, &["up"]).unwrap();
    /// assert_eq!(encoder.encode(&up).unwrap().unwrap().to_string(), "0010");
    /// assert_eq!(encoder.encode(&up).unwrap(), None);
    /// ```
    pub fn encode(&mut self, snapshot: &Snapshot) -> Result<Option<WireState>, EncodeError> {
        let rendered = self.render(snapshot)?;
        if rendered == self.last_sent {
            return Ok(None);
        }
        trace!(from = %self.last_sent, to = %rendered, "state changed");
        self.last_sent = rendered.clone();
        Ok(Some(rendered))
    }

    /// The state most recently returned by [`encode`](Self::encode), or the
    /// all-zero baseline.
    pub fn last_sent(&self) -> &WireState {
        &self.last_sent
    }

    pub fn layout(&self) -> &BitLayout {
        &self.layout
    }

    /// Restores the all-zero baseline.
    pub fn reset(&mut self) {
        self.last_sent = WireState::zeroed(self.layout.len());
    }

    fn render(&self, snapshot: &Snapshot) -> Result<WireState, EncodeError> {
        if snapshot.len() != self.layout.len() {
            return Err(EncodeError::SignalCountMismatch {
                expected: self.layout.len(),
                got: snapshot.len(),
            });
        }

        let mut bits = Vec::with_capacity(self.layout.len());
        for (position, (expected, (got, active))) in self
            .layout
            .signals()
            .iter()
            .zip(snapshot.states())
            .enumerate()
        {
            if expected != got {
                return Err(EncodeError::SignalMismatch {
                    position,
                    expected: expected.to_string(),
                    got: got.to_string(),
                });
            }
            bits.push(*active);
        }
        Ok(WireState::from_bits(bits))
    }
}
