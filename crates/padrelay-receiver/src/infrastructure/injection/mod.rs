//! Input injector backends.
//!
//! - **`log`** – dry run; every event becomes a log line.
//! - **`keyboard`** – presses real keys through a platform [`KeyBackend`].
//! - **`mock`** – records events in memory for tests.
//!
//! The OS key backend is selected at compile time via
//! `#[cfg(target_os = ...)]`.

pub mod keyboard;
pub mod log;
pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

pub use keyboard::{KeyBackend, KeyBindings, KeyboardInjector};

use crate::application::receive_state::{InjectionError, InputInjector};

/// Builds a [`KeyboardInjector`] on this platform's native key backend.
///
/// # Errors
///
/// Returns [`InjectionError::Unsupported`] where no backend exists, or
/// [`InjectionError::Platform`] if the backend cannot be opened.
pub fn platform_keyboard(bindings: KeyBindings) -> Result<Box<dyn InputInjector>, InjectionError> {
    #[cfg(target_os = "linux")]
    {
        let backend = linux::UinputBackend::new(bindings.keys())?;
        Ok(Box::new(KeyboardInjector::new(backend, bindings)))
    }

    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(KeyboardInjector::new(
            windows::SendInputBackend::new(),
            bindings,
        )))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        let _ = bindings;
        Err(InjectionError::Unsupported)
    }
}
