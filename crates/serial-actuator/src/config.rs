use crate::constants;
use actuator_protocol::{ActuatorError, SerialConfig};
use core_types::ActuatorSwitch;
use serde::{Deserialize, Serialize};
use switch_mapper::SignalVocabulary;

/// Everything needed to build a [`SerialActuator`](crate::SerialActuator).
///
/// Every field has a default, so a config file only has to name what it
/// changes:
///
/// ```json
/// { "port_name": "/dev/ttyACM0", "serial": { "baud_rate": 115200 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub port_name: String,
    pub serial: SerialConfig,
    /// Source name of the switch events are emitted for
    pub switch_source: String,
    /// Longest buffered line in bytes; None disables the cap
    pub max_line_len: Option<usize>,
    pub vocabulary: SignalVocabulary,
    pub status_channel_capacity: usize,
}

impl ActuatorConfig {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Reject configurations the transport or framer cannot honor.
    pub fn validate(&self) -> Result<(), ActuatorError> {
        if self.port_name.trim().is_empty() {
            return Err(ActuatorError::Config(
                "Serial port name is empty - set port_name to the device path (e.g. /dev/ttyUSB0 or COM3)".into(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(ActuatorError::Config(
                "Baud rate must be greater than zero".into(),
            ));
        }
        if !(5..=8).contains(&self.serial.data_bits) {
            return Err(ActuatorError::Config(format!(
                "Unsupported data bits {} - use 5, 6, 7 or 8",
                self.serial.data_bits
            )));
        }
        if !matches!(self.serial.stop_bits, 1 | 2) {
            return Err(ActuatorError::Config(format!(
                "Unsupported stop bits {} - use 1 or 2",
                self.serial.stop_bits
            )));
        }
        if self.max_line_len == Some(0) {
            return Err(ActuatorError::Config(
                "max_line_len of 0 would discard every line - use null to disable the cap".into(),
            ));
        }
        if self.switch_source.is_empty() {
            return Err(ActuatorError::Config("Switch source name is empty".into()));
        }
        Ok(())
    }

    /// The switch this actuator registers with the host.
    pub fn default_switch(&self) -> ActuatorSwitch {
        ActuatorSwitch::new(
            self.switch_source.clone(),
            constants::switch::DEFAULT_NAME,
            constants::switch::DEFAULT_COMMAND,
        )
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            port_name: constants::serial::DEFAULT_PORT_NAME.into(),
            serial: SerialConfig::new_8n1(constants::serial::DEFAULT_BAUD_RATE),
            switch_source: constants::switch::DEFAULT_SOURCE.into(),
            max_line_len: Some(constants::framing::DEFAULT_MAX_LINE_LEN),
            vocabulary: SignalVocabulary::default(),
            status_channel_capacity: constants::channels::STATUS_CHANNEL_CAPACITY,
        }
    }
}
