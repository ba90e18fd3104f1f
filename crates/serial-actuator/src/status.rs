use actuator_protocol::ActuatorEvent;
use core_types::actuator_warn;
use futures_channel::mpsc;
use std::sync::{Mutex, PoisonError};

/// Sends status events to the host without ever blocking the caller.
pub struct StatusReporter {
    tx: Mutex<mpsc::Sender<ActuatorEvent>>,
}

impl StatusReporter {
    pub fn new(tx: mpsc::Sender<ActuatorEvent>) -> Self {
        Self { tx: Mutex::new(tx) }
    }

    /// Failures are logged but don't propagate - status events are
    /// informational and must not stall the I/O thread
    pub fn report(&self, event: ActuatorEvent) {
        let result = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_send(event);

        if let Err(e) = result {
            let reason = if e.is_disconnected() { "closed" } else { "full" };
            actuator_warn!("Status event dropped (channel {}): {:?}", reason, e.into_inner());
        }
    }
}
