//! Core bus modules - pub/sub events and singleton commands.
//!
//! These modules form the coordination backbone, independent of UI.

pub mod command_hub;
pub mod event_bus;

// Re-exports for convenience
pub use command_hub::{Command, CommandError, CommandHub};
pub use event_bus::EventBus;
