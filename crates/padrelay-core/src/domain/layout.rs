//! The bit layout: an ordered list of signals.
//!
//! # Why an ordered list and not a set?
//!
//! The wire format carries one bit per signal and has no names in it.  The
//! only thing that says "bit 2 is `up`" is the position of `up` in this list.
//! Sender and receiver must therefore hold the *same* list in the *same*
//! order for the whole session.  A mismatch is not detectable from the state
//! frames themselves; the Hello frame (see [`crate::protocol::frame`]) exists
//! so that the receiver can compare layouts when the connection opens.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Upper bound on the number of signals in one layout.
pub const MAX_SIGNALS: usize = 256;

/// Errors produced while building or querying a [`BitLayout`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// A layout must contain at least one signal.
    #[error("layout has no signals")]
    Empty,

    /// The signal name at this position is empty or contains whitespace.
    #[error("invalid signal name at position {0}")]
    InvalidName(usize),

    /// The same name appears twice.
    #[error("duplicate signal: {0}")]
    DuplicateSignal(String),

    /// More signals than [`MAX_SIGNALS`].
    #[error("too many signals: max {max}, got {got}")]
    TooManySignals { max: usize, got: usize },

    /// A name that is not part of the layout was referenced.
    #[error("unknown signal: {0}")]
    UnknownSignal(String),
}

/// A named logical input such as `left` or `up`.
///
/// Cloning is cheap (reference-counted string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signal(Arc<str>);

impl Signal {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && !name.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Signal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Signal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self(Arc::from(name)))
    }
}

impl From<&str> for Signal {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Ordered, non-empty list of unique signals.
///
/// Bit `i` of every wire state refers to `signals()[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitLayout {
    signals: Vec<Signal>,
}

impl BitLayout {
    /// Builds a layout from signal names in bit order.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the list is empty, too long, contains an
    /// invalid name, or contains a duplicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use padrelay_core::BitLayout;
    ///
    /// let layout = BitLayout::new(["left", "down", "up", "right"]).unwrap();
    /// assert_eq!(layout.position_of("up"), Some(2));
    /// ```
    pub fn new<I, S>(names: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut signals: Vec<Signal> = Vec::new();
        for (position, name) in names.into_iter().enumerate() {
            let name = name.as_ref();
            if !Signal::is_valid_name(name) {
                return Err(LayoutError::InvalidName(position));
            }
            if signals.iter().any(|s| s.as_str() == name) {
                return Err(LayoutError::DuplicateSignal(name.to_string()));
            }
            signals.push(Signal::new(name));
        }

        if signals.is_empty() {
            return Err(LayoutError::Empty);
        }
        if signals.len() > MAX_SIGNALS {
            return Err(LayoutError::TooManySignals {
                max: MAX_SIGNALS,
                got: signals.len(),
            });
        }
        Ok(Self { signals })
    }

    /// Number of signals, which is also the length of every wire state.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Always `false`; a layout cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn signal_at(&self, position: usize) -> Option<&Signal> {
        self.signals.get(position)
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.as_str() == name)
    }

    /// Returns `true` if `names` lists exactly this layout's signals in the
    /// same order.
    pub fn matches<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.len() == self.signals.len()
            && names
                .iter()
                .zip(&self.signals)
                .all(|(name, signal)| name.as_ref() == signal.as_str())
    }

    /// Signal names in bit order.
    pub fn names(&self) -> Vec<String> {
        self.signals.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl Default for BitLayout {
    /// The four-direction pad layout: `[left, down, up, right]`.
    fn default() -> Self {
        Self {
            signals: ["left", "down", "up", "right"]
                .into_iter()
                .map(Signal::new)
                .collect(),
        }
    }
}
