//! Linux key backend: a uinput virtual keyboard.
//!
//! Needs write access to `/dev/uinput` (root, or a udev rule granting the
//! `input` group).  The device only advertises the keys that are bound.

use std::collections::BTreeSet;

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AttributeSet, EventType, InputEvent, Key,
};
use padrelay_core::KeyCode;
use tracing::{debug, warn};

use super::keyboard::KeyBackend;
use crate::application::receive_state::InjectionError;

const DEVICE_NAME: &str = "padrelay virtual keyboard";

const KEY_UP: i32 = 0;
const KEY_DOWN: i32 = 1;

fn platform(e: std::io::Error) -> InjectionError {
    InjectionError::Platform(e.to_string())
}

pub struct UinputBackend {
    device: VirtualDevice,
    /// evdev codes currently held, released on drop.
    held: BTreeSet<u16>,
}

impl UinputBackend {
    /// Creates the virtual keyboard.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::Platform`] if `/dev/uinput` cannot be opened.
    pub fn new<I>(keys: I) -> Result<Self, InjectionError>
    where
        I: IntoIterator<Item = KeyCode>,
    {
        let keys = AttributeSet::from_iter(keys.into_iter().map(|k| Key::new(k.to_evdev_code())));
        let device = VirtualDeviceBuilder::new()
            .map_err(platform)?
            .name(DEVICE_NAME)
            .with_keys(&keys)
            .map_err(platform)?
            .build()
            .map_err(platform)?;
        debug!("created uinput device {DEVICE_NAME:?}");
        Ok(Self {
            device,
            held: BTreeSet::new(),
        })
    }

    fn emit(&mut self, code: u16, value: i32) -> Result<(), InjectionError> {
        // `emit` terminates the batch with SYN_REPORT.
        self.device
            .emit(&[InputEvent::new(EventType::KEY, code, value)])
            .map_err(platform)
    }
}

impl KeyBackend for UinputBackend {
    fn key_down(&mut self, key: KeyCode) -> Result<(), InjectionError> {
        let code = key.to_evdev_code();
        self.emit(code, KEY_DOWN)?;
        self.held.insert(code);
        Ok(())
    }

    fn key_up(&mut self, key: KeyCode) -> Result<(), InjectionError> {
        let code = key.to_evdev_code();
        self.emit(code, KEY_UP)?;
        self.held.remove(&code);
        Ok(())
    }
}

impl Drop for UinputBackend {
    fn drop(&mut self) {
        for code in std::mem::take(&mut self.held) {
            if let Err(e) = self.emit(code, KEY_UP) {
                warn!("failed to release key {code} on shutdown: {e}");
            }
        }
    }
}
