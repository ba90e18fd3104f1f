use crate::state::ActuatorState;
use serde::{Deserialize, Serialize};

/// Serial configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: ParityMode,
    pub flow_control: FlowControl,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParityMode {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Hardware,
    Software,
}

impl SerialConfig {
    /// Create a standard 8N1 configuration at specified baud rate
    pub fn new_8n1(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            parity: ParityMode::None,
            flow_control: FlowControl::None,
        }
    }

    /// Parse a framing string such as "8N1", "7E1" or "8O2".
    ///
    /// Returns None for anything that is not `<data bits><N|E|O><stop bits>`.
    pub fn from_framing(framing: &str, baud_rate: u32) -> Option<Self> {
        let mut chars = framing.trim().chars();
        let data_bits = chars.next()?.to_digit(10)?;
        let parity = match chars.next()?.to_ascii_uppercase() {
            'N' => ParityMode::None,
            'E' => ParityMode::Even,
            'O' => ParityMode::Odd,
            _ => return None,
        };
        let stop_bits = chars.next()?.to_digit(10)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self {
            baud_rate,
            data_bits: u8::try_from(data_bits).ok()?,
            stop_bits: u8::try_from(stop_bits).ok()?,
            parity,
            flow_control: FlowControl::None,
        })
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new_8n1(9600)
    }
}

/// Status events from the actuator to the host.
///
/// Switch events travel through the event sink; this channel only carries
/// lifecycle and diagnostic information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ActuatorEvent {
    /// Lifecycle state has changed
    StateChanged { state: ActuatorState },

    /// Transport failed or a lifecycle operation could not complete
    Error { message: String },

    /// An overlong line was discarded by the framer
    FramingError { discarded: usize, max: usize },
}
