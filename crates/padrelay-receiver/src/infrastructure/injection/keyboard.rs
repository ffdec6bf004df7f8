//! Keyboard injector: turns decoded signal events into key presses.
//!
//! [`KeyBindings`] is the receiver's Key Mapping, one [`KeyCode`] per signal
//! of the layout.  [`KeyboardInjector`] looks the key up and forwards the
//! press or release to a [`KeyBackend`], which is the only part that talks to
//! the OS.

use std::collections::HashMap;

use padrelay_core::{BitLayout, KeyCode, Signal, Transition};
use tracing::debug;

use crate::application::receive_state::{InjectionError, InputInjector};

/// OS-level key press/release.
#[cfg_attr(test, mockall::automock)]
pub trait KeyBackend: Send {
    fn key_down(&mut self, key: KeyCode) -> Result<(), InjectionError>;
    fn key_up(&mut self, key: KeyCode) -> Result<(), InjectionError>;
}

/// Signal → key table, validated against a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    keys: HashMap<Signal, KeyCode>,
}

impl KeyBindings {
    /// Looks up a key for every signal of `layout`.
    ///
    /// Every signal needs its own key: a key shared by two signals would be
    /// pressed twice and released while still held.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::UnboundSignal`] for the first signal that
    /// `lookup` has no key for, and [`InjectionError::DuplicateKey`] for the
    /// first key bound to two signals.
    pub fn new<F>(layout: &BitLayout, lookup: F) -> Result<Self, InjectionError>
    where
        F: Fn(&Signal) -> Option<KeyCode>,
    {
        let mut keys = HashMap::with_capacity(layout.len());
        let mut owners: HashMap<KeyCode, &Signal> = HashMap::with_capacity(layout.len());
        for signal in layout.signals() {
            let key = lookup(signal)
                .ok_or_else(|| InjectionError::UnboundSignal(signal.as_str().to_string()))?;
            if let Some(first) = owners.insert(key, signal) {
                return Err(InjectionError::DuplicateKey {
                    key,
                    first: first.as_str().to_string(),
                    second: signal.as_str().to_string(),
                });
            }
            keys.insert(signal.clone(), key);
        }
        Ok(Self { keys })
    }

    pub fn key_for(&self, signal: &Signal) -> Option<KeyCode> {
        self.keys.get(signal).copied()
    }

    /// Every bound key, ordered by HID usage.
    pub fn keys(&self) -> Vec<KeyCode> {
        let mut keys: Vec<KeyCode> = self.keys.values().copied().collect();
        keys.sort_by_key(|key| key.hid_usage());
        keys
    }
}

pub struct KeyboardInjector<B> {
    backend: B,
    bindings: KeyBindings,
}

impl<B: KeyBackend> KeyboardInjector<B> {
    pub fn new(backend: B, bindings: KeyBindings) -> Self {
        Self { backend, bindings }
    }
}

impl<B: KeyBackend> InputInjector for KeyboardInjector<B> {
    fn apply(&mut self, signal: &Signal, transition: Transition) -> Result<(), InjectionError> {
        let key = self
            .bindings
            .key_for(signal)
            .ok_or_else(|| InjectionError::UnboundSignal(signal.as_str().to_string()))?;
        debug!("{signal} {transition} -> {key}");
        match transition {
            Transition::Pressed => self.backend.key_down(key),
            Transition::Released => self.backend.key_up(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::{predicate::eq, Sequence};

    fn arrow_bindings() -> KeyBindings {
        KeyBindings::new(&BitLayout::default(), |signal| match signal.as_str() {
            "left" => Some(KeyCode::ArrowLeft),
            "down" => Some(KeyCode::ArrowDown),
            "up" => Some(KeyCode::ArrowUp),
            "right" => Some(KeyCode::ArrowRight),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_bindings_require_a_key_for_every_signal() {
        let result = KeyBindings::new(&BitLayout::default(), |signal| {
            (signal.as_str() != "up").then_some(KeyCode::Space)
        });

        assert!(matches!(result, Err(InjectionError::UnboundSignal(name)) if name == "up"));
    }

    #[test]
    fn test_bindings_reject_a_key_shared_by_two_signals() {
        // Arrange: `left` and `down` both want Space
        let lookup = |signal: &Signal| match signal.as_str() {
            "left" | "down" => Some(KeyCode::Space),
            "up" => Some(KeyCode::ArrowUp),
            _ => Some(KeyCode::ArrowRight),
        };

        // Act
        let result = KeyBindings::new(&BitLayout::default(), lookup);

        // Assert
        match result {
            Err(InjectionError::DuplicateKey { key, first, second }) => {
                assert_eq!(key, KeyCode::Space);
                assert_eq!(first, "left");
                assert_eq!(second, "down");
            }
            other => panic!("expected duplicate key error, got {other:?}"),
        }
    }

    #[test]
    fn test_bindings_list_keys_in_hid_order() {
        assert_eq!(
            arrow_bindings().keys(),
            vec![
                KeyCode::ArrowRight,
                KeyCode::ArrowLeft,
                KeyCode::ArrowDown,
                KeyCode::ArrowUp
            ]
        );
    }

    #[test]
    fn test_press_and_release_map_to_key_down_and_up() {
        // Arrange
        let mut backend = MockKeyBackend::new();
        let mut seq = Sequence::new();
        backend
            .expect_key_down()
            .with(eq(KeyCode::ArrowUp))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        backend
            .expect_key_up()
            .with(eq(KeyCode::ArrowUp))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let mut injector = KeyboardInjector::new(backend, arrow_bindings());

        // Act
        let pressed = injector.apply(&Signal::new("up"), Transition::Pressed);
        let released = injector.apply(&Signal::new("up"), Transition::Released);

        // Assert
        tokio_test::assert_ok!(pressed);
        tokio_test::assert_ok!(released);
    }

    #[test]
    fn test_unknown_signal_never_reaches_backend() {
        let mut backend = MockKeyBackend::new();
        backend.expect_key_down().never();
        let mut injector = KeyboardInjector::new(backend, arrow_bindings());

        let result = injector.apply(&Signal::new("jump"), Transition::Pressed);

        assert!(matches!(result, Err(InjectionError::UnboundSignal(_))));
    }

    #[test]
    fn test_backend_errors_are_returned() {
        let mut backend = MockKeyBackend::new();
        backend
            .expect_key_down()
            .returning(|_| Err(InjectionError::Platform("denied".to_string())));
        let mut injector = KeyboardInjector::new(backend, arrow_bindings());

        let result = injector.apply(&Signal::new("left"), Transition::Pressed);

        assert!(matches!(result, Err(InjectionError::Platform(msg)) if msg == "denied"));
    }
}
