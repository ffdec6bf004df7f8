//! Dry-run injector: logs every event instead of touching the keyboard.

use padrelay_core::{Signal, Transition};
use tracing::info;

use crate::application::receive_state::{InjectionError, InputInjector};

#[derive(Debug, Default)]
pub struct LogInjector;

impl LogInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for LogInjector {
    fn apply(&mut self, signal: &Signal, transition: Transition) -> Result<(), InjectionError> {
        info!("{signal} {transition}");
        Ok(())
    }
}
