//! Overlay events.
//!
//! Fired by any component that runs a long operation; handled only by
//! OverlayState. Spinner events are reference-counted, so nested operations
//! can each emit their own start/stop pair.

/// Increment the busy-spinner reference count.
#[derive(Clone, Debug)]
pub struct SpinnerStartEvent;

/// Decrement the busy-spinner reference count (clamped at zero).
#[derive(Clone, Debug)]
pub struct SpinnerStopEvent;

/// Show the progress overlay with a fresh header; text/value reset to defaults.
#[derive(Clone, Debug)]
pub struct ProgressStartEvent(pub String);

/// Partial progress update; omitted fields keep their previous value.
#[derive(Clone, Debug, Default)]
pub struct ProgressUpdateEvent {
    pub text: Option<String>,
    pub value: Option<f32>,
}

/// Hide the progress overlay (stored text/value are kept until the next start).
#[derive(Clone, Debug)]
pub struct ProgressEndEvent;
