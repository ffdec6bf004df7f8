//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML file shared with the sender and
//! falls back to defaults when it does not exist.

pub mod config;
