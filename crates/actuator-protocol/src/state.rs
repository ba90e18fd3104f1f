use crate::errors::ActuatorError;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// # Actuator State Machine
///
/// Lifecycle state of a serial actuator. The lifecycle owns transitions; the
/// switch mapper only reads the state to decide whether a classified line may
/// produce an event.
///
/// ## State Transition Diagram
///
/// ```text
///              init / resume
///   ┌─────────┐ ─────────────► ┌─────────┐  pause   ┌────────┐
///   │ Stopped │                │ Running │ ───────► │ Paused │
///   └─────────┘ ◄───────────── └─────────┘ ◄─────── └────────┘
///        ▲        dispose /                  resume      │
///        │        transport failure                      │
///        └───────────────────────────────────────────────┘
///                           dispose
/// ```
///
/// ## State Invariants
///
/// - **Stopped**: Initial state. No events are emitted.
/// - **Running**: Classified lines produce switch events.
/// - **Paused**: Transport stays open, lines are consumed and dropped.
///
/// No transition emits a switch event by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ActuatorState {
    /// Not initialized, disposed, or the transport failed
    Stopped,

    /// Initialized but not forwarding events
    Paused,

    /// Forwarding switch events to the host
    Running,
}

impl ActuatorState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Validate if transition to new_state is allowed from current state
    pub fn can_transition_to(&self, new_state: ActuatorState) -> bool {
        use ActuatorState::*;

        match (self, new_state) {
            (Stopped, Running) => true, // init succeeded / resume
            (Paused, Running) => true,  // resume
            (Running, Paused) => true,  // pause

            // Teardown and transport failure are accepted from anywhere
            (_, Stopped) => true,

            // Idempotent (repeated pause/resume from the host)
            (Running, Running) => true,
            (Paused, Paused) => true,

            // Cannot pause something that never started
            (Stopped, Paused) => false,
        }
    }

    /// Convert state to u8 value for atomic storage
    pub fn to_u8(self) -> u8 {
        match self {
            ActuatorState::Stopped => 0,
            ActuatorState::Paused => 1,
            ActuatorState::Running => 2,
        }
    }

    /// Convert u8 value back to state
    /// Returns None if value is invalid
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ActuatorState::Stopped),
            1 => Some(ActuatorState::Paused),
            2 => Some(ActuatorState::Running),
            _ => None,
        }
    }
}

/// Atomically visible actuator state shared between the lifecycle thread
/// and the I/O thread.
///
/// Stores use `Release` and loads use `Acquire`: once `pause` returns, the
/// next emission pass observes `Paused`.
#[derive(Debug, Clone)]
pub struct SharedActuatorState {
    inner: Arc<AtomicU8>,
}

impl SharedActuatorState {
    pub fn new(initial: ActuatorState) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(initial.to_u8())),
        }
    }

    pub fn load(&self) -> ActuatorState {
        // Only values written by `to_u8` are ever stored
        ActuatorState::from_u8(self.inner.load(Ordering::Acquire)).unwrap_or(ActuatorState::Stopped)
    }

    pub fn is_running(&self) -> bool {
        self.load().is_running()
    }

    /// Attempt to move to `new_state`, returning the previous state.
    ///
    /// The check and the store happen in one compare-exchange loop, so two
    /// racing transitions cannot both validate against the same old state.
    pub fn transition(&self, new_state: ActuatorState) -> Result<ActuatorState, ActuatorError> {
        self.transition_where(new_state, |_| true)
    }

    /// Like [`transition`](Self::transition), but refuses to leave `Stopped`.
    ///
    /// Used by `resume`: a transport failure may stop the actuator at any
    /// moment, and a racing resume must not bring it back to `Running`.
    pub fn transition_if_started(
        &self,
        new_state: ActuatorState,
    ) -> Result<ActuatorState, ActuatorError> {
        self.transition_where(new_state, |old| old != ActuatorState::Stopped)
    }

    fn transition_where(
        &self,
        new_state: ActuatorState,
        allowed_from: impl Fn(ActuatorState) -> bool,
    ) -> Result<ActuatorState, ActuatorError> {
        let mut current = self.inner.load(Ordering::Acquire);
        loop {
            let old_state = ActuatorState::from_u8(current).unwrap_or(ActuatorState::Stopped);
            if !allowed_from(old_state) || !old_state.can_transition_to(new_state) {
                return Err(ActuatorError::InvalidTransition(format!(
                    "{:?} → {:?}",
                    old_state, new_state
                )));
            }
            match self.inner.compare_exchange_weak(
                current,
                new_state.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(old_state),
                Err(actual) => current = actual,
            }
        }
    }

    /// Unconditionally force `Stopped` (teardown, transport failure).
    pub fn stop(&self) -> ActuatorState {
        let previous = self.inner.swap(ActuatorState::Stopped.to_u8(), Ordering::AcqRel);
        ActuatorState::from_u8(previous).unwrap_or(ActuatorState::Stopped)
    }
}

impl Default for SharedActuatorState {
    fn default() -> Self {
        Self::new(ActuatorState::Stopped)
    }
}
