//! Centralized logging macros for the actuator crates
//!
//! These macros keep a single call-site vocabulary across the workspace and
//! forward to [`tracing`](crate::tracing), so every crate logs through the
//! same subscriber the host application installs.

/// Log trace-level message
///
/// Use for per-line decisions on the hot path (ignored lines, gated lines)
#[macro_export]
macro_rules! actuator_trace {
    ($($arg:tt)*) => {
        $crate::tracing::trace!($($arg)*)
    };
}

/// Log debug-level message
///
/// # Example
/// ```
/// use core_types::actuator_debug;
/// actuator_debug!("SerialActuator: {:?} → {:?}", "Stopped", "Running");
/// ```
#[macro_export]
macro_rules! actuator_debug {
    ($($arg:tt)*) => {
        $crate::tracing::debug!($($arg)*)
    };
}

/// Log info-level message
///
/// Use for lifecycle changes (port opened, actuator paused)
#[macro_export]
macro_rules! actuator_info {
    ($($arg:tt)*) => {
        $crate::tracing::info!($($arg)*)
    };
}

/// Log warning-level message
///
/// Use for recoverable conditions (dropped events, overlong lines)
#[macro_export]
macro_rules! actuator_warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!($($arg)*)
    };
}

/// Log error-level message
///
/// Use for transport failures that stop the actuator
#[macro_export]
macro_rules! actuator_error {
    ($($arg:tt)*) => {
        $crate::tracing::error!($($arg)*)
    };
}
