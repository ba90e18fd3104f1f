use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
    #[error("Already open")]
    AlreadyOpen,
    #[error("Other: {0}")]
    Other(String),
}

/// Callback invoked with every chunk read from the transport.
///
/// Arguments are the raw bytes and a timestamp in microseconds since the
/// transport was opened. May be called from a dedicated I/O thread, and an
/// implementation is allowed to deliver overlapping notifications, so the
/// handler must do its own locking.
pub type DataHandler = Arc<dyn Fn(&[u8], u64) + Send + Sync>;

/// Callback invoked once when the transport fails after a successful open.
pub type ErrorHandler = Arc<dyn Fn(TransportError) + Send + Sync>;

/// A push-style byte-stream transport (serial port, loopback, test double).
///
/// The transport owns the connection handle. `open` starts delivery into
/// `on_data`; `close` stops delivery and releases the handle. After `close`
/// returns no further handler invocations may start.
pub trait Transport: Send {
    /// Open the connection and start delivering chunks.
    fn open(&mut self, on_data: DataHandler, on_error: ErrorHandler) -> Result<(), TransportError>;

    /// Stop delivery and close the connection. Closing a closed transport is a no-op.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Whether `open` succeeded and `close` has not been called since.
    fn is_open(&self) -> bool;

    /// Human-readable name used in logs (e.g. the port path).
    fn name(&self) -> &str;
}
