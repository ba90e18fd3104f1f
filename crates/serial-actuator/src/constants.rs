//! Centralized configuration defaults for the serial actuator
//!
//! Every default an [`ActuatorConfig`](crate::ActuatorConfig) falls back to
//! is defined here.

/// Serial line parameters
pub mod serial {
    /// Port opened when no port is configured
    ///
    /// Port discovery is the host's job; this is only the fallback name.
    #[cfg(windows)]
    pub const DEFAULT_PORT_NAME: &str = "COM3";
    #[cfg(not(windows))]
    pub const DEFAULT_PORT_NAME: &str = "/dev/ttyUSB0";

    /// Default baud rate
    ///
    /// **Value**: 9600 baud, 8N1
    ///
    /// **Rationale**: Switch boxes send a few short lines per second. 9600 is
    /// the rate microcontroller sketches default to and leaves plenty of
    /// headroom for that traffic.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
}

/// Switch identity
pub mod switch {
    /// Source name the actuator resolves its switch by
    pub const DEFAULT_SOURCE: &str = "SerSwi";

    /// Display name of the default switch
    pub const DEFAULT_NAME: &str = "Serial Input Reader";

    /// Host command bound to the default switch
    pub const DEFAULT_COMMAND: &str = "CmdMainMenu";
}

/// Framing limits
pub mod framing {
    /// Longest line buffered before it is discarded (bytes)
    ///
    /// **Value**: 4096 bytes
    ///
    /// **Rationale**: Signal lines are a few dozen bytes. A sender that never
    /// emits a newline (wrong baud rate, binary firmware) would otherwise grow
    /// the buffer without bound. 4 KiB is two orders of magnitude above any
    /// real signal and small enough to never matter for memory.
    pub const DEFAULT_MAX_LINE_LEN: usize = ::framing::DEFAULT_MAX_LINE_LEN;
}

/// Host channels
pub mod channels {
    /// Capacity of the status event channel
    ///
    /// **Value**: 64 events
    ///
    /// **Rationale**: Status events are rare (state changes, framing errors).
    /// A host that stops draining the channel loses status events, never
    /// switch events and never blocks the I/O thread.
    pub const STATUS_CHANNEL_CAPACITY: usize = 64;
}
