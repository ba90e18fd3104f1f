use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod logging;
pub mod transport;
pub use transport::{DataHandler, ErrorHandler, Transport, TransportError};

#[doc(hidden)]
pub use tracing;

/// One framed unit of input: the bytes between two newlines.
///
/// The trailing `\n` is never included. Anything before it, including a
/// `\r` from CRLF senders, is kept as received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Line {
    /// The raw bytes comprising this line.
    pub bytes: Vec<u8>,
    /// Timestamp (microseconds) of the chunk in which this line started arriving.
    pub timestamp_us: u64,
}

impl Line {
    pub fn new(bytes: Vec<u8>, timestamp_us: u64) -> Self {
        Self {
            bytes,
            timestamp_us,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Lossy UTF-8 view, for logging.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// The three kinds of switch event a host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchEventKind {
    Activate,
    Deactivate,
    Trigger,
}

impl SwitchEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Trigger => "trigger",
        }
    }
}

/// Identity of a switch registered with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorSwitch {
    /// Source name the actuator looks the switch up by (e.g. "SerSwi").
    pub source: String,
    /// Display name.
    pub name: String,
    /// Host command bound to the switch.
    pub command: String,
}

impl ActuatorSwitch {
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            command: command.into(),
        }
    }
}

/// Shared, immutable handle to a registered switch.
///
/// Lookups hand out clones of the `Arc`, never copies of the switch.
pub type SwitchHandle = Arc<ActuatorSwitch>;

/// A switch event ready for the host event sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwitchEvent {
    pub kind: SwitchEventKind,
    pub switch: SwitchHandle,
    /// Timestamp inherited from the line that produced the event.
    pub timestamp_us: u64,
}

impl SwitchEvent {
    pub fn new(kind: SwitchEventKind, switch: SwitchHandle, timestamp_us: u64) -> Self {
        Self {
            kind,
            switch,
            timestamp_us,
        }
    }

    pub fn source(&self) -> &str {
        &self.switch.source
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_line_helpers() {
        let line = Line::new(b"xyz=false".to_vec(), 100);
        assert_eq!(line.as_bytes(), b"xyz=false");
        assert_eq!(line.len(), 9);
        assert!(!line.is_empty());
        assert_eq!(line.to_string_lossy(), "xyz=false");
        assert!(Line::new(Vec::new(), 0).is_empty());
    }

    #[test]
    fn test_line_lossy_invalid_utf8() {
        let line = Line::new(vec![0x66, 0xFF, 0x66], 0);
        assert_eq!(line.to_string_lossy(), "f\u{FFFD}f");
    }

    #[test]
    fn test_switch_event_serialization() {
        let switch = Arc::new(ActuatorSwitch::new("SerSwi", "Serial Input Reader", "CmdMainMenu"));
        let event = SwitchEvent::new(SwitchEventKind::Trigger, switch, 1000);
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: SwitchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
        assert_eq!(deserialized.source(), "SerSwi");
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(SwitchEventKind::Activate.as_str(), "activate");
        assert_eq!(SwitchEventKind::Deactivate.as_str(), "deactivate");
        assert_eq!(SwitchEventKind::Trigger.as_str(), "trigger");
    }
}
