//! # Framing
//!
//! Turns an arbitrarily chunked byte stream into discrete [`Line`]s.
//!
//! [`Line`]: core_types::Line

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

use thiserror::Error;

pub mod lines;

pub use lines::{LineFramer, Lines, DEFAULT_MAX_LINE_LEN};

/// Problems found while framing. None of them stop the framer: after
/// reporting, it resynchronizes on the next newline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// A line grew past the configured cap and was thrown away
    #[error("Line exceeded {max} bytes ({discarded} bytes discarded); check the device baud rate and line terminator")]
    LineTooLong { discarded: usize, max: usize },
}
