//! One tick's worth of device state.

use super::layout::{BitLayout, LayoutError, Signal};

/// The pressed/not-pressed state of every signal at one sample tick.
///
/// A snapshot is immutable once built.  Samplers should construct it with
/// [`Snapshot::capture`], which visits every signal of the layout in order
/// and therefore cannot produce a malformed snapshot.  [`Snapshot::from_pairs`]
/// accepts arbitrary input; the encoder rejects anything that does not line up
/// with its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    states: Vec<(Signal, bool)>,
}

impl Snapshot {
    /// Samples every signal of `layout` in bit order through `is_active`.
    pub fn capture<F>(layout: &BitLayout, mut is_active: F) -> Self
    where
        F: FnMut(&Signal) -> bool,
    {
        let states = layout
            .signals()
            .iter()
            .map(|signal| (signal.clone(), is_active(signal)))
            .collect();
        Self { states }
    }

    /// Builds a snapshot in which exactly the named signals are active.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownSignal`] if a name is not in `layout`.
    pub fn from_active<S: AsRef<str>>(layout: &BitLayout, active: &[S]) -> Result<Self, LayoutError> {
        if let Some(unknown) = active
            .iter()
            .map(AsRef::as_ref)
            .find(|name| layout.position_of(name).is_none())
        {
            return Err(LayoutError::UnknownSignal(unknown.to_string()));
        }
        Ok(Self::capture(layout, |signal| {
            active.iter().any(|name| name.as_ref() == signal.as_str())
        }))
    }

    /// Builds a snapshot from raw pairs without checking them.
    pub fn from_pairs(states: Vec<(Signal, bool)>) -> Self {
        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// `(signal, active)` pairs in the order they were captured.
    pub fn states(&self) -> &[(Signal, bool)] {
        &self.states
    }

    /// Names of the active signals, in order.
    pub fn active(&self) -> impl Iterator<Item = &Signal> {
        self.states
            .iter()
            .filter(|(_, active)| *active)
            .map(|(signal, _)| signal)
    }
}
