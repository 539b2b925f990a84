//! Spinner and progress overlay state, driven by bus events.

pub mod overlay_events;
pub mod overlay_state;

pub use overlay_state::OverlayState;
