//! TOML-based configuration for the receiver.
//!
//! Same file and default location ([`padrelay_core::config`]) as the
//! sender's configuration; the receiver reads `[network]`, `[receiver]` and
//! the `key` of each `[[signals]]` entry, and ignores the sender-only parts.
//!
//! ```toml
//! log_level = "info"
//!
//! [network]
//! address = "127.0.0.1"
//! port = 8765
//!
//! [receiver]
//! injector = "keyboard"   # or "log" for a dry run
//! reconnect_secs = 0      # 0 = exit when the sender goes away
//!
//! [[signals]]
//! name = "left"
//! key = "ArrowLeft"
//! ```

use std::path::Path;
use std::time::Duration;

use padrelay_core::config::load_toml;
use padrelay_core::{BitLayout, KeyCode, LayoutError};
use serde::{Deserialize, Serialize};

pub use padrelay_core::config::{default_config_path, ConfigError};

// ── Config schema types ───────────────────────────────────────────────────────

/// Receiver configuration as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiverConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub receiver: ReceiverSection,
    /// Ordered signal table; must match the sender's.
    #[serde(default = "default_signals")]
    pub signals: Vec<SignalEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Sender host or IP address to connect to.
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiverSection {
    #[serde(default)]
    pub injector: InjectorKind,
    /// Seconds to wait before reconnecting; `0` disables reconnecting.
    #[serde(default)]
    pub reconnect_secs: u64,
}

/// Which injector backend replays the events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InjectorKind {
    /// Log each event; touch nothing.
    #[default]
    Log,
    /// Press real keys through the OS.
    Keyboard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalEntry {
    pub name: String,
    /// Key pressed while the signal is held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyCode>,
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
fn default_signals() -> Vec<SignalEntry> {
    [
        ("left", KeyCode::ArrowLeft),
        ("down", KeyCode::ArrowDown),
        ("up", KeyCode::ArrowUp),
        ("right", KeyCode::ArrowRight),
    ]
    .into_iter()
    .map(|(name, key)| SignalEntry {
        name: name.to_string(),
        key: Some(key),
    })
    .collect()
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            network: NetworkConfig::default(),
            receiver: ReceiverSection::default(),
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

impl Default for ReceiverSection {
    fn default() -> Self {
        Self {
            injector: InjectorKind::Log,
            reconnect_secs: 0,
        }
    }
}

impl ReceiverConfig {
    /// Builds the bit layout from the `[[signals]]` table.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] for an empty table, invalid or duplicate names.
    pub fn layout(&self) -> Result<BitLayout, LayoutError> {
        BitLayout::new(self.signals.iter().map(|s| s.name.as_str()))
    }

    pub fn key_for(&self, name: &str) -> Option<KeyCode> {
        self.signals
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.key)
    }

    /// WebSocket URL of the sender.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.network.address, self.network.port)
    }

    /// Delay between connection attempts, or `None` to connect only once.
    pub fn reconnect_delay(&self) -> Option<Duration> {
        (self.receiver.reconnect_secs > 0).then(|| Duration::from_secs(self.receiver.reconnect_secs))
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Loads the config at `path`, returning `ReceiverConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ReceiverConfig, ConfigError> {
    load_toml(path)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
