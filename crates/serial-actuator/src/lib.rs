//! # Serial Actuator
//!
//! Reads newline-delimited signals from a serial line and forwards them to
//! the host as switch events.
//!
//! ## Components
//!
//! - **SerialActuator**: lifecycle (init / pause / resume / dispose), owns the transport
//! - **InputPipeline**: framer + mapper, driven by the transport's data callback
//! - **ActuatorConfig**: serde-loadable settings with defaults from [`constants`]
//!
//! ```text
//! Transport ──bytes──► InputPipeline ──► LineFramer ──► SwitchEventMapper ──► EventSink
//!     │                                                                         (host)
//!     └──failure──► SerialActuator ──► ActuatorEvent ──► host status channel
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod actuator;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod status;

pub use actuator::SerialActuator;
pub use config::ActuatorConfig;
pub use pipeline::InputPipeline;
pub use status::StatusReporter;
