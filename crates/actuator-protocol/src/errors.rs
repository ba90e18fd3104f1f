//! Error Handling Guidelines
//!
//! Error messages say what failed, why if known, and what to do when the
//! caller can act on it:
//! - ✅ "Failed to open serial port /dev/ttyUSB0: Device busy. Close other programs and retry."
//! - ❌ "Error"

use thiserror::Error;

/// Unified error type for actuator lifecycle operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// State transition was rejected
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Transport layer error (open failed, connection lost)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation attempted after dispose
    #[error("Actuator has been disposed; create a new instance to reconnect")]
    Disposed,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ActuatorError {
    fn from(s: String) -> Self {
        ActuatorError::Other(s)
    }
}

impl From<&str> for ActuatorError {
    fn from(s: &str) -> Self {
        ActuatorError::Other(s.to_string())
    }
}
