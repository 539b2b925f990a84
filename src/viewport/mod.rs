//! Viewport-side overlays: per-frame projection of anchored annotations.

pub mod projector;
pub mod viewport_events;

pub use projector::{AnnotationProjection, AnnotationProjector};
