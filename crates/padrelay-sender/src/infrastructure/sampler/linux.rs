//! Linux evdev sampler.
//!
//! Reads the kernel's current key state of one `/dev/input/event*` device
//! with `EVIOCGKEY` (`Device::get_key_state`).  Polling the state instead of
//! consuming the event stream means a dropped or coalesced event can never
//! leave a signal stuck: every tick sees the true state.
//!
//! The process needs read access to the device node, which usually means
//! membership in the `input` group.

use std::path::PathBuf;

use evdev::{Device, Key};
use padrelay_core::{BitLayout, DeviceInfo, Snapshot};
use tracing::{debug, info};

use super::{ButtonMap, SamplerFactory};
use crate::application::transmit_state::{SampleError, StateSampler};

/// Enumerates input devices sorted by device node path.
fn enumerate_devices() -> Vec<(PathBuf, Device)> {
    let mut devices: Vec<_> = evdev::enumerate().collect();
    devices.sort_by(|a, b| a.0.cmp(&b.0));
    devices
}

fn device_name(device: &Device) -> &str {
    device.name().unwrap_or("Unnamed device")
}

pub fn list_devices() -> Vec<DeviceInfo> {
    enumerate_devices()
        .iter()
        .enumerate()
        .map(|(index, (_, device))| DeviceInfo::new(index, device_name(device)))
        .collect()
}

/// Samples one evdev device.  Dropping it closes the device.
pub struct EvdevSampler {
    device: Device,
    info: DeviceInfo,
    layout: BitLayout,
    keys: Vec<Key>,
}

impl EvdevSampler {
    /// Opens the device at `index` in [`list_devices`] order.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidDeviceIndex`] if there is no such device.
    pub fn open(index: usize, layout: BitLayout, buttons: &ButtonMap) -> Result<Self, SampleError> {
        let mut devices = enumerate_devices();
        let available = devices.len();
        if index >= available {
            return Err(SampleError::InvalidDeviceIndex { index, available });
        }

        let (path, device) = devices.swap_remove(index);
        let info = DeviceInfo::new(index, device_name(&device));
        info!("opened input device {info} ({})", path.display());

        Ok(Self {
            device,
            info,
            layout,
            keys: buttons.codes().iter().map(|code| Key::new(*code)).collect(),
        })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

impl StateSampler for EvdevSampler {
    fn sample(&mut self) -> Result<Snapshot, SampleError> {
        let pressed = self.device.get_key_state()?;
        let states = self
            .layout
            .signals()
            .iter()
            .zip(&self.keys)
            .map(|(signal, key)| (signal.clone(), pressed.contains(*key)))
            .collect();
        Ok(Snapshot::from_pairs(states))
    }
}

impl Drop for EvdevSampler {
    fn drop(&mut self) {
        debug!("released input device {}", self.info);
    }
}

/// Opens the configured device once per connection.
pub struct EvdevSamplerFactory {
    device_index: usize,
    layout: BitLayout,
    buttons: ButtonMap,
}

impl EvdevSamplerFactory {
    /// Checks that the device exists now so a bad index fails at startup
    /// rather than on the first connection.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidDeviceIndex`] if there is no such device.
    pub fn new(device_index: usize, layout: BitLayout, buttons: ButtonMap) -> Result<Self, SampleError> {
        let available = list_devices().len();
        if device_index >= available {
            return Err(SampleError::InvalidDeviceIndex {
                index: device_index,
                available,
            });
        }
        Ok(Self {
            device_index,
            layout,
            buttons,
        })
    }
}

impl SamplerFactory for EvdevSamplerFactory {
    fn open(&self) -> Result<Box<dyn StateSampler>, SampleError> {
        let sampler = EvdevSampler::open(self.device_index, self.layout.clone(), &self.buttons)?;
        Ok(Box::new(sampler))
    }
}
