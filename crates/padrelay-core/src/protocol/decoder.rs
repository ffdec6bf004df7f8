//! Edge-detecting state decoder.
//!
//! The decoder keeps the last known value of every signal and, for each
//! received wire state, emits one event per signal whose bit *flipped*:
//!
//! | stored | incoming | event      |
//! |--------|----------|------------|
//! | 0      | 0        | none       |
//! | 0      | 1        | `Pressed`  |
//! | 1      | 1        | none       |
//! | 1      | 0        | `Released` |
//!
//! Acting on the raw bit ("1 means press") would re-press a held key on every
//! message and never release it.  Deriving events from the difference between
//! consecutive full states gives hold semantics: a signal is down for exactly
//! the span between its `Pressed` and its `Released`.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::wire::WireState;
use crate::domain::layout::{BitLayout, Signal};

/// A received wire state could not be applied.
///
/// Decoder state is never mutated when this is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("wire state has {got} bits, layout has {expected} signals")]
    LengthMismatch { expected: usize, got: usize },
}

/// Direction of a signal change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Pressed,
    Released,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Pressed => f.write_str("pressed"),
            Transition::Released => f.write_str("released"),
        }
    }
}

/// One discrete press or release derived from a wire state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEvent {
    /// Bit position of the signal in the layout.
    pub position: usize,
    pub signal: Signal,
    pub transition: Transition,
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.signal, self.transition)
    }
}

/// Receiver-side per-signal state.
///
/// Lives for one connection and is owned by exactly one decode loop.
#[derive(Debug, Clone)]
pub struct StateDecoder {
    layout: BitLayout,
    state: Vec<bool>,
}

impl StateDecoder {
    /// Creates a decoder with every signal released.
    pub fn new(layout: BitLayout) -> Self {
        let state = vec![false; layout.len()];
        Self { layout, state }
    }

    /// Applies a received wire state and returns the resulting events in
    /// ascending bit order.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::LengthMismatch`] if `wire` does not have one
    /// bit per signal.  Nothing is partially applied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use padrelay_core::{BitLayout, StateDecoder, Transition};
    ///
    /// let mut decoder = StateDecoder::new(BitLayout::default());
    /// let events = decoder.apply(&"1000".parse().unwrap()).unwrap();
    /// assert_eq!(events.len(), 1);
    /// assert_eq!(events[0].signal.as_str(), "left");
    /// assert_eq!(events[0].transition, Transition::Pressed);
    ///
    /// // Same state again: the key is held, nothing new happens.
    /// assert!(decoder.apply(&"1000".parse().unwrap()).unwrap().is_empty());
    /// ```
    pub fn apply(&mut self, wire: &WireState) -> Result<Vec<SignalEvent>, DecodeError> {
        if wire.len() != self.state.len() {
            return Err(DecodeError::LengthMismatch {
                expected: self.state.len(),
                got: wire.len(),
            });
        }

        let mut events = Vec::new();
        for (position, (stored, incoming)) in self.state.iter_mut().zip(wire.bits()).enumerate() {
            if *stored == *incoming {
                continue;
            }
            *stored = *incoming;
            let transition = if *incoming {
                Transition::Pressed
            } else {
                Transition::Released
            };
            let signal = self.layout.signals()[position].clone();
            debug!(%signal, %transition, "signal changed");
            events.push(SignalEvent {
                position,
                signal,
                transition,
            });
        }
        Ok(events)
    }

    /// Emits a `Released` for every held signal and clears all state.
    ///
    /// Used when the connection drops so that nothing stays pressed on the
    /// receiving machine.
    pub fn release_all(&mut self) -> Vec<SignalEvent> {
        let events = self
            .state
            .iter()
            .enumerate()
            .filter(|(_, held)| **held)
            .map(|(position, _)| SignalEvent {
                position,
                signal: self.layout.signals()[position].clone(),
                transition: Transition::Released,
            })
            .collect();
        self.reset();
        events
    }

    /// Forgets all state: every signal is released again.
    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|held| *held = false);
    }

    pub fn is_pressed(&self, name: &str) -> bool {
        self.layout
            .position_of(name)
            .map(|position| self.state[position])
            .unwrap_or(false)
    }

    /// Signals currently held down.
    pub fn held(&self) -> impl Iterator<Item = &Signal> {
        self.layout
            .signals()
            .iter()
            .zip(&self.state)
            .filter(|(_, held)| **held)
            .map(|(signal, _)| signal)
    }

    pub fn layout(&self) -> &BitLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(text: &str) -> WireState {
        text.parse().unwrap()
    }

    fn names(events: &[SignalEvent]) -> Vec<String> {
        events.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_new_decoder_holds_nothing() {
        let decoder = StateDecoder::new(BitLayout::default());
        assert_eq!(decoder.held().count(), 0);
        assert!(!decoder.is_pressed("left"));
    }

    #[test]
    fn test_rising_edge_emits_pressed_once() {
        // Arrange
        let mut decoder = StateDecoder::new(BitLayout::default());

        // Act
        let first = decoder.apply(&wire("0010")).unwrap();
        let repeat = decoder.apply(&wire("0010")).unwrap();

        // Assert
        assert_eq!(names(&first), vec!["up:pressed"]);
        assert!(repeat.is_empty(), "a held bit must not re-press");
        assert!(decoder.is_pressed("up"));
    }

    #[test]
    fn test_falling_edge_emits_released_once() {
        let mut decoder = StateDecoder::new(BitLayout::default());
        decoder.apply(&wire("0001")).unwrap();

        let release = decoder.apply(&wire("0000")).unwrap();
        let again = decoder.apply(&wire("0000")).unwrap();

        assert_eq!(names(&release), vec!["right:released"]);
        assert!(again.is_empty());
    }

    #[test]
    fn test_simultaneous_changes_are_ordered_by_position() {
        let mut decoder = StateDecoder::new(BitLayout::default());
        decoder.apply(&wire("1001")).unwrap();

        let events = decoder.apply(&wire("0110")).unwrap();

        assert_eq!(
            names(&events),
            vec!["left:released", "down:pressed", "up:pressed", "right:released"]
        );
        assert_eq!(events[1].position, 1);
    }

    #[test]
    fn test_length_mismatch_is_rejected_without_mutation() {
        // Arrange
        let mut decoder = StateDecoder::new(BitLayout::default());
        decoder.apply(&wire("0100")).unwrap();

        // Act
        let short = decoder.apply(&wire("1"));
        let long = decoder.apply(&wire("11111"));

        // Assert
        assert_eq!(short, Err(DecodeError::LengthMismatch { expected: 4, got: 1 }));
        assert_eq!(long, Err(DecodeError::LengthMismatch { expected: 4, got: 5 }));
        assert_eq!(decoder.held().map(Signal::as_str).collect::<Vec<_>>(), vec!["down"]);
    }

    #[test]
    fn test_reset_then_full_state_presses_only_active_signals() {
        let mut decoder = StateDecoder::new(BitLayout::default());
        decoder.apply(&wire("1111")).unwrap();

        decoder.reset();
        let events = decoder.apply(&wire("1010")).unwrap();

        assert_eq!(names(&events), vec!["left:pressed", "up:pressed"]);
    }

    #[test]
    fn test_release_all_releases_held_signals_and_clears_state() {
        let mut decoder = StateDecoder::new(BitLayout::default());
        decoder.apply(&wire("0101")).unwrap();

        let events = decoder.release_all();

        assert_eq!(names(&events), vec!["down:released", "right:released"]);
        assert_eq!(decoder.held().count(), 0);
        assert!(decoder.release_all().is_empty());
    }

    #[test]
    fn test_is_pressed_for_unknown_signal_is_false() {
        let decoder = StateDecoder::new(BitLayout::default());
        assert!(!decoder.is_pressed("jump"));
    }
}
