//! The wire state: one `'0'`/`'1'` character per signal, in layout order.
//!
//! Wire format for four signals `[left, down, up, right]` with `left` and
//! `up` held:
//!
//! ```text
//! 1010
//! ```
//!
//! The encoding is total: every position is present on every message.  A
//! parsed wire state knows nothing about any layout; the decoder is the one
//! that checks the length against its own layout.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::layout::MAX_SIGNALS;

/// Errors that can occur while parsing a wire state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The text was empty.
    #[error("empty wire state")]
    Empty,

    /// More characters than any layout has signals.
    #[error("wire state has {len} characters, at most {max} allowed")]
    TooLong { len: usize, max: usize },

    /// A character other than `0` or `1` was found.
    #[error("invalid bit {found:?} at position {position}")]
    InvalidBit { position: usize, found: char },
}

/// A fixed-length bit-per-signal serialization of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireState {
    bits: Vec<bool>,
}

impl WireState {
    /// Creates a wire state from bits in layout order.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// All-zero state of the given length; the implicit baseline before
    /// anything has been sent or received.
    pub fn zeroed(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bit(&self, position: usize) -> Option<bool> {
        self.bits.get(position).copied()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// `true` if no bit is set.
    pub fn is_idle(&self) -> bool {
        self.bits.iter().all(|b| !b)
    }
}

impl fmt::Display for WireState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for WireState {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(WireError::Empty);
        }
        // Checked on bytes before anything is allocated.
        if s.len() > MAX_SIGNALS {
            return Err(WireError::TooLong {
                len: s.len(),
                max: MAX_SIGNALS,
            });
        }
        let bits = s
            .chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                found => Err(WireError::InvalidBit { position, found }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_writes_one_char_per_bit() {
        let state = WireState::from_bits(vec![true, false, true, false]);
        assert_eq!(state.to_string(), "1010");
    }

    #[test]
    fn test_parse_accepts_zeros_and_ones() {
        let state: WireState = "0110".parse().unwrap();
        assert_eq!(state.bits(), &[false, true, true, false]);
        assert_eq!(state.bit(1), Some(true));
        assert_eq!(state.bit(4), None);
    }

    #[test]
    fn test_parse_rejects_other_characters() {
        let result = "10x1".parse::<WireState>();
        assert_eq!(
            result,
            Err(WireError::InvalidBit {
                position: 2,
                found: 'x'
            })
        );
    }

    #[test]
    fn test_parse_rejects_text_longer_than_any_layout() {
        let longest = "1".repeat(MAX_SIGNALS);
        let oversized = "0".repeat(4 * 1024 * 1024);

        assert_eq!(longest.parse::<WireState>().map(|w| w.len()), Ok(MAX_SIGNALS));
        assert_eq!(
            oversized.parse::<WireState>(),
            Err(WireError::TooLong {
                len: 4 * 1024 * 1024,
                max: MAX_SIGNALS
            })
        );
    }

    #[test]
    fn test_parse_rejects_trailing_newline() {
        assert!(matches!(
            "1001\n".parse::<WireState>(),
            Err(WireError::InvalidBit { position: 4, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_empty_text() {
        assert_eq!("".parse::<WireState>(), Err(WireError::Empty));
    }

    #[test]
    fn test_zeroed_is_idle() {
        let state = WireState::zeroed(3);
        assert_eq!(state.to_string(), "000");
        assert!(state.is_idle());
        assert!(!WireState::from_bits(vec![false, true]).is_idle());
    }
}
