//! Overlay visibility state: busy spinner and progress bar.
//!
//! Single owner for state that used to live in scattered globals: the spinner
//! reference count and the progress header/text/value. Mutated only through
//! the bus events in overlay_events.rs; the shell reads it once per frame to
//! draw the overlays.

use std::sync::{Arc, Mutex};

use log::debug;

use crate::core::event_bus::EventBus;
use crate::overlay::overlay_events::*;

/// Progress value used right after progress_start().
const PROGRESS_DEFAULT_VALUE: f32 = 0.0;

/// Spinner + progress overlay state.
///
/// Spinner visibility is derived: visible iff the reference count is above
/// zero, so nested operations can start/stop independently.
#[derive(Debug, Default)]
pub struct OverlayState {
    spinner_count: u32,
    progress_visible: bool,
    progress_header: String,
    progress_text: String,
    progress_value: f32,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Spinner ==========

    /// Increment the spinner reference count.
    pub fn start_spinner(&mut self) {
        self.spinner_count += 1;
        if self.spinner_count == 1 {
            debug!("spinner shown");
        }
    }

    /// Decrement the spinner reference count, clamped at zero.
    ///
    /// Stopping with no active spinner is a no-op: imbalanced call sequences
    /// from nested operations must not underflow the count.
    pub fn stop_spinner(&mut self) {
        if self.spinner_count == 0 {
            debug!("stop_spinner with no active spinner, ignored");
            return;
        }
        self.spinner_count -= 1;
        if self.spinner_count == 0 {
            debug!("spinner hidden");
        }
    }

    pub fn spinner_visible(&self) -> bool {
        self.spinner_count > 0
    }

    pub fn spinner_count(&self) -> u32 {
        self.spinner_count
    }

    // ========== Progress ==========

    /// Show the progress overlay and reset text/value to defaults.
    pub fn progress_start(&mut self, header: &str) {
        debug!("progress start: {}", header);
        self.progress_visible = true;
        self.progress_header = header.to_string();
        self.progress_text = String::new();
        self.progress_value = PROGRESS_DEFAULT_VALUE;
    }

    /// Update only the fields present; omitted fields keep their value.
    /// Value is clamped into [0,1].
    pub fn progress_update(&mut self, text: Option<&str>, value: Option<f32>) {
        if let Some(text) = text {
            self.progress_text = text.to_string();
        }
        if let Some(value) = value {
            let clamped = value.clamp(0.0, 1.0);
            if clamped != value {
                debug!("progress value {} clamped to {}", value, clamped);
            }
            self.progress_value = clamped;
        }
    }

    /// Hide the progress overlay. Stored text/value stay as-is; they are
    /// overwritten by the next progress_start().
    pub fn progress_end(&mut self) {
        debug!("progress end");
        self.progress_visible = false;
    }

    pub fn progress_visible(&self) -> bool {
        self.progress_visible
    }

    pub fn progress_header(&self) -> &str {
        &self.progress_header
    }

    pub fn progress_text(&self) -> &str {
        &self.progress_text
    }

    pub fn progress_value(&self) -> f32 {
        self.progress_value
    }

    // ========== Wiring ==========

    /// Subscribe the shared state to all overlay events on the bus.
    pub fn wire(bus: &EventBus, state: Arc<Mutex<OverlayState>>) {
        let s = Arc::clone(&state);
        bus.subscribe::<SpinnerStartEvent, _>(move |_| {
            s.lock().unwrap_or_else(|e| e.into_inner()).start_spinner();
        });

        let s = Arc::clone(&state);
        bus.subscribe::<SpinnerStopEvent, _>(move |_| {
            s.lock().unwrap_or_else(|e| e.into_inner()).stop_spinner();
        });

        let s = Arc::clone(&state);
        bus.subscribe::<ProgressStartEvent, _>(move |e| {
            s.lock().unwrap_or_else(|e| e.into_inner()).progress_start(&e.0);
        });

        let s = Arc::clone(&state);
        bus.subscribe::<ProgressUpdateEvent, _>(move |e| {
            s.lock()
                .unwrap_or_else(|e| e.into_inner())
                .progress_update(e.text.as_deref(), e.value);
        });

        let s = Arc::clone(&state);
        bus.subscribe::<ProgressEndEvent, _>(move |_| {
            s.lock().unwrap_or_else(|e| e.into_inner()).progress_end();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_refcount() {
        let mut state = OverlayState::new();
        assert!(!state.spinner_visible());

        state.start_spinner();
        state.start_spinner();
        assert!(state.spinner_visible());
        assert_eq!(state.spinner_count(), 2);

        state.stop_spinner();
        assert!(state.spinner_visible());

        state.stop_spinner();
        assert!(!state.spinner_visible());
    }

    #[test]
    fn test_spinner_underflow_is_noop() {
        let mut state = OverlayState::new();
        state.stop_spinner();
        state.stop_spinner();
        assert_eq!(state.spinner_count(), 0);

        // Count still behaves after imbalanced stops
        state.start_spinner();
        assert!(state.spinner_visible());
    }

    #[test]
    fn test_spinner_count_matches_starts_minus_stops() {
        // count = max(0, starts - stops) over arbitrary interleavings
        let sequences: &[&[bool]] = &[
            &[true, true, false, false],
            &[false, true, false, false, true],
            &[true, false, false, true, true, false],
        ];
        for seq in sequences {
            let mut state = OverlayState::new();
            let mut expected: i32 = 0;
            for &start in *seq {
                if start {
                    state.start_spinner();
                    expected += 1;
                } else {
                    state.stop_spinner();
                    expected = (expected - 1).max(0);
                }
                assert_eq!(state.spinner_count() as i32, expected);
                assert_eq!(state.spinner_visible(), expected > 0);
            }
        }
    }

    #[test]
    fn test_progress_partial_update() {
        let mut state = OverlayState::new();
        state.progress_start("Exporting");
        assert!(state.progress_visible());
        assert_eq!(state.progress_header(), "Exporting");
        assert_eq!(state.progress_text(), "");
        assert_eq!(state.progress_value(), 0.0);

        state.progress_update(None, Some(0.4));
        // Text and header untouched by a value-only update
        assert_eq!(state.progress_text(), "");
        assert_eq!(state.progress_header(), "Exporting");
        assert_eq!(state.progress_value(), 0.4);

        state.progress_update(Some("frame 12/30"), None);
        assert_eq!(state.progress_text(), "frame 12/30");
        assert_eq!(state.progress_value(), 0.4);
    }

    #[test]
    fn test_progress_value_clamped() {
        let mut state = OverlayState::new();
        state.progress_start("Exporting");

        state.progress_update(None, Some(1.7));
        assert_eq!(state.progress_value(), 1.0);

        state.progress_update(None, Some(-0.3));
        assert_eq!(state.progress_value(), 0.0);
    }

    #[test]
    fn test_progress_end_keeps_fields_until_next_start() {
        let mut state = OverlayState::new();
        state.progress_start("Pass 1");
        state.progress_update(Some("halfway"), Some(0.5));
        state.progress_end();
        assert!(!state.progress_visible());
        assert_eq!(state.progress_text(), "halfway");
        assert_eq!(state.progress_value(), 0.5);

        state.progress_start("Pass 2");
        assert_eq!(state.progress_text(), "");
        assert_eq!(state.progress_value(), 0.0);
    }

    #[test]
    fn test_wired_to_bus() {
        let bus = EventBus::new();
        let state = Arc::new(Mutex::new(OverlayState::new()));
        OverlayState::wire(&bus, Arc::clone(&state));

        bus.emit(SpinnerStartEvent);
        bus.emit(ProgressStartEvent("Loading".into()));
        bus.emit(ProgressUpdateEvent { text: None, value: Some(0.25) });

        {
            let s = state.lock().unwrap();
            assert!(s.spinner_visible());
            assert!(s.progress_visible());
            assert_eq!(s.progress_value(), 0.25);
        }

        bus.emit(SpinnerStopEvent);
        bus.emit(ProgressEndEvent);

        let s = state.lock().unwrap();
        assert!(!s.spinner_visible());
        assert!(!s.progress_visible());
    }
}
