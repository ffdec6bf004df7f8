//! TOML-based configuration for the sender.
//!
//! The file is shared with the receiver; each binary reads the sections it
//! needs and ignores the rest.  See [`padrelay_core::config`] for its default
//! location.
//!
//! ```toml
//! log_level = "info"
//!
//! [network]
//! address = "127.0.0.1"
//! port = 8765
//!
//! [sampler]
//! tick_interval_ms = 100
//! device_index = 0
//!
//! [[signals]]
//! name = "left"
//! button = 0x222     # BTN_DPAD_LEFT
//! ```
//!
//! The order of `[[signals]]` entries is the bit order on the wire.

use std::path::Path;
use std::time::Duration;

use padrelay_core::config::load_toml;
use padrelay_core::{BitLayout, LayoutError};
use serde::{Deserialize, Serialize};

pub use padrelay_core::config::{default_config_path, ConfigError};

// ── Config schema types ───────────────────────────────────────────────────────

/// Sender configuration as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SenderConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    /// Ordered signal table; position in this list is the bit position.
    #[serde(default = "default_signals")]
    pub signals: Vec<SignalEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// IP address the WebSocket server binds to.
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplerConfig {
    /// Milliseconds between two samples; at least 1.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Index into the device list printed by `--list-devices`.
    #[serde(default)]
    pub device_index: usize,
}

/// One signal of the bit layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalEntry {
    pub name: String,
    /// evdev key/button code sampled for this signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<u16>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_address() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8765
}
fn default_tick_interval_ms() -> u64 {
    100
}
fn default_signals() -> Vec<SignalEntry> {
    // BTN_DPAD_UP .. BTN_DPAD_RIGHT from linux/input-event-codes.h
    [("left", 0x222), ("down", 0x221), ("up", 0x220), ("right", 0x223)]
        .into_iter()
        .map(|(name, button)| SignalEntry {
            name: name.to_string(),
            button: Some(button),
        })
        .collect()
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            network: NetworkConfig::default(),
            sampler: SamplerConfig::default(),
            signals: default_signals(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            device_index: 0,
        }
    }
}

impl SenderConfig {
    /// Builds the bit layout from the `[[signals]]` table.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] for an empty table, invalid or duplicate names.
    pub fn layout(&self) -> Result<BitLayout, LayoutError> {
        BitLayout::new(self.signals.iter().map(|s| s.name.as_str()))
    }

    /// evdev code configured for the signal called `name`.
    pub fn button_for(&self, name: &str) -> Option<u16> {
        self.signals
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.button)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.sampler.tick_interval_ms)
    }

    /// Rejects values that parse but cannot be run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `sampler.tick_interval_ms` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampler.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "sampler.tick_interval_ms",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Loads and validates the config at `path`, returning
/// `SenderConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if a value fails [`SenderConfig::validate`].
pub fn load_config(path: &Path) -> Result<SenderConfig, ConfigError> {
    let config: SenderConfig = load_toml(path)?;
    config.validate()?;
    Ok(config)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
