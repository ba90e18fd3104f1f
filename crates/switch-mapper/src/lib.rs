//! # Switch Mapper
//!
//! Interprets framed lines as switch signals and forwards the resulting
//! switch events to the host.
//!
//! ## Pieces
//!
//! - **SignalClassifier**: decides which event kind, if any, a line means
//! - **SwitchRegistry**: resolves the switch a signal belongs to
//! - **EventSink**: the host's activate / deactivate / trigger entry points
//! - **SwitchEventMapper**: ties them together behind the running-state gate
//!
//! ```text
//! Line → SignalClassifier → (Running?) → SwitchRegistry::find → EventSink
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod mapper;
pub mod registry;
pub mod sink;
pub mod vocabulary;

pub use mapper::{MapperStats, SwitchEventMapper};
pub use registry::{SwitchRegistry, SwitchTable};
pub use sink::{ChannelSink, EventSink};
pub use vocabulary::{SignalClassifier, SignalPattern, SignalVocabulary};
