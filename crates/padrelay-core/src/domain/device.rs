//! Identity of an input device a sampler can read from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An input device as listed by a sampler backend.
///
/// `index` is the position in the backend's listing and is what the
/// configuration refers to when selecting a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
}

impl DeviceInfo {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.index, self.name)
    }
}
