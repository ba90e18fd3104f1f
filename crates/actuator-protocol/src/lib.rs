//! # Actuator Protocol
//!
//! Shared vocabulary between the serial actuator and its host.
//!
//! This crate defines the lifecycle state machine, the status events the
//! actuator reports to the host, serial line parameters and the error type.
//! It has no I/O and no dependency on a serial backend, so it is fully
//! testable on its own.
//!
//! ## Message Flow
//!
//! ```text
//! Host → init/pause/resume/dispose → SerialActuator
//!                                         ↓
//!                                   ActuatorEvent → Host
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod errors;
pub mod messages;
pub mod state;

pub use errors::ActuatorError;
pub use messages::{ActuatorEvent, FlowControl, ParityMode, SerialConfig};
pub use state::{ActuatorState, SharedActuatorState};
