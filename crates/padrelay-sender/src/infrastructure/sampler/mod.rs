//! Input sampler backends for the sender.
//!
//! On Linux the sampler reads the current key/button state of an evdev
//! device (`/dev/input/event*`) once per tick.  Every connection opens its
//! own device handle through a [`SamplerFactory`] and releases it when the
//! session ends.
//!
//! # Testability
//!
//! [`mock::ScriptedSampler`] replays a fixed list of snapshots without any
//! device; it also drives the `--demo` mode of the binary.

use std::sync::Arc;

use padrelay_core::{BitLayout, DeviceInfo, Signal};

use crate::application::transmit_state::{SampleError, StateSampler};

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

/// Opens a fresh sampler for each accepted connection.
pub trait SamplerFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn StateSampler>, SampleError>;
}

/// Evdev button code for every signal, in layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMap {
    codes: Vec<u16>,
}

impl ButtonMap {
    /// Resolves a code for each signal of `layout` through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::UnmappedSignal`] for the first signal without a
    /// code.
    pub fn new<F>(layout: &BitLayout, lookup: F) -> Result<Self, SampleError>
    where
        F: Fn(&Signal) -> Option<u16>,
    {
        let codes = layout
            .signals()
            .iter()
            .map(|signal| lookup(signal).ok_or_else(|| SampleError::UnmappedSignal(signal.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { codes })
    }

    pub fn codes(&self) -> &[u16] {
        &self.codes
    }
}

/// Lists the input devices the platform sampler can open.
///
/// Indexes are stable for as long as the set of connected devices does not
/// change.
pub fn list_devices() -> Vec<DeviceInfo> {
    #[cfg(target_os = "linux")]
    {
        linux::list_devices()
    }

    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

/// Creates the platform sampler factory for the device at `device_index`.
///
/// # Errors
///
/// Returns [`SampleError::InvalidDeviceIndex`] when no such device exists and
/// [`SampleError::Unsupported`] on platforms without a device sampler.
pub fn device_factory(
    device_index: usize,
    layout: BitLayout,
    buttons: ButtonMap,
) -> Result<Arc<dyn SamplerFactory>, SampleError> {
    #[cfg(target_os = "linux")]
    {
        let factory = linux::EvdevSamplerFactory::new(device_index, layout, buttons)?;
        Ok(Arc::new(factory))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = (device_index, layout, buttons);
        Err(SampleError::Unsupported)
    }
}
