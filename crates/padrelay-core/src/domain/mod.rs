//! Domain values for padrelay.
//!
//! Nothing in here performs I/O.  The types describe *what* is relayed: the
//! fixed, ordered set of signals, a snapshot of which of them are active at
//! one tick, and the identity of an input device.

/// Ordered signal list shared by sender and receiver.
pub mod layout;

/// Per-tick immutable device state.
pub mod snapshot;

pub mod device;
