//! Recording injector for tests.
//!
//! Every applied event is pushed onto a shared `Mutex<Vec<...>>`.  Keep a
//! [`EventLog`] handle from [`RecordingInjector::log`] before boxing the
//! injector into a use case, then inspect it after the run.
//!
//! Set `should_fail` to make every call return
//! [`InjectionError::Platform`] after recording it.

use std::sync::{Arc, Mutex};

use padrelay_core::{Signal, Transition};

use crate::application::receive_state::{InjectionError, InputInjector};

/// Shared record of `(signal name, transition)` pairs in call order.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<(String, Transition)>>>);

impl EventLog {
    /// Copy of the events recorded so far.
    pub fn events(&self) -> Vec<(String, Transition)> {
        match self.0.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Events rendered as `"signal:transition"`.
    pub fn rendered(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|(signal, transition)| format!("{signal}:{transition}"))
            .collect()
    }

    fn push(&self, signal: &Signal, transition: Transition) {
        let entry = (signal.as_str().to_string(), transition);
        match self.0.lock() {
            Ok(mut events) => events.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingInjector {
    log: EventLog,
    pub should_fail: bool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto this injector's record; stays valid after the injector is
    /// moved.
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

impl InputInjector for RecordingInjector {
    fn apply(&mut self, signal: &Signal, transition: Transition) -> Result<(), InjectionError> {
        self.log.push(signal, transition);
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".to_string()));
        }
        Ok(())
    }
}
