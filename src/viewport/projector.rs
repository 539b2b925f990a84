//! Screen-space annotation projector.
//!
//! Keeps a screen-space annotation glued to a fixed 3D anchor point. Runs once
//! per pre-render tick: project the anchor through the current view-projection
//! matrix, decide visibility, and cache the pixel position for the overlay.
//!
//! Conventions:
//! - Normalized screen space: x,y in [0,1], origin top-left, +Y down.
//! - Depth: GL convention remapped to [0,1].
//! - The annotation is hidden whenever the camera matrix is unavailable or
//!   the projected point leaves the unit box on any axis.

use std::sync::{Arc, Mutex};

use eframe::egui;
use glam::{Mat4, Vec3};

use crate::core::event_bus::EventBus;
use crate::viewport::viewport_events::{PreRenderEvent, ViewportResizedEvent};

/// Result of projecting the anchor for one frame.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationProjection {
    pub world_position: Vec3,
    /// x,y normalized to [0,1], z = depth in [0,1]. Only meaningful while visible.
    pub screen_position: Vec3,
    pub visible: bool,
}

/// Per-frame world-to-screen mapping for one anchored annotation.
#[derive(Debug)]
pub struct AnnotationProjector {
    anchor: Vec3,
    canvas: egui::Rect,
    last_view_proj: Option<Mat4>,
    projection: AnnotationProjection,
}

impl AnnotationProjector {
    pub fn new(anchor: Vec3) -> Self {
        Self {
            anchor,
            canvas: egui::Rect::ZERO,
            last_view_proj: None,
            projection: AnnotationProjection {
                world_position: anchor,
                screen_position: Vec3::ZERO,
                visible: false,
            },
        }
    }

    /// Per-frame update: remember the camera snapshot and reproject.
    pub fn on_prerender(&mut self, view_proj: Option<Mat4>) {
        self.last_view_proj = view_proj;
        self.reproject();
    }

    /// Resize update: reproject against the last camera snapshot so the
    /// annotation follows the canvas without waiting for the next tick.
    pub fn on_resize(&mut self, canvas: egui::Rect) {
        self.canvas = canvas;
        self.reproject();
    }

    pub fn projection(&self) -> AnnotationProjection {
        self.projection
    }

    /// Pixel position of the annotation inside the canvas, while visible.
    pub fn pixel_position(&self) -> Option<egui::Pos2> {
        if !self.projection.visible || self.canvas.width() <= 0.0 || self.canvas.height() <= 0.0 {
            return None;
        }
        let screen = self.projection.screen_position;
        Some(egui::pos2(
            self.canvas.min.x + screen.x * self.canvas.width(),
            self.canvas.min.y + screen.y * self.canvas.height(),
        ))
    }

    fn reproject(&mut self) {
        self.projection.world_position = self.anchor;

        let Some(view_proj) = self.last_view_proj else {
            // No camera data this tick: hide and skip all math
            self.projection.visible = false;
            return;
        };

        let clip = view_proj * self.anchor.extend(1.0);
        if clip.w <= f32::EPSILON {
            // Behind the camera or degenerate projection
            self.projection.visible = false;
            return;
        }

        let ndc = clip.truncate() / clip.w;
        let screen = Vec3::new(
            (ndc.x + 1.0) * 0.5,
            (1.0 - ndc.y) * 0.5,
            ndc.z * 0.5 + 0.5,
        );
        self.projection.screen_position = screen;

        let unit = 0.0..=1.0;
        self.projection.visible =
            unit.contains(&screen.x) && unit.contains(&screen.y) && unit.contains(&screen.z);
    }

    // ========== Wiring ==========

    /// Subscribe the shared projector to pre-render and resize events.
    pub fn wire(bus: &EventBus, projector: Arc<Mutex<AnnotationProjector>>) {
        let p = Arc::clone(&projector);
        bus.subscribe::<PreRenderEvent, _>(move |e| {
            p.lock().unwrap_or_else(|e| e.into_inner()).on_prerender(e.view_proj);
        });

        let p = Arc::clone(&projector);
        bus.subscribe::<ViewportResizedEvent, _>(move |e| {
            p.lock().unwrap_or_else(|e| e.into_inner()).on_resize(e.canvas);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(100.0, 50.0), egui::vec2(200.0, 100.0))
    }

    #[test]
    fn test_hidden_without_camera() {
        let mut p = AnnotationProjector::new(Vec3::ZERO);
        p.on_resize(canvas());
        p.on_prerender(None);
        assert!(!p.projection().visible);
        assert!(p.pixel_position().is_none());
    }

    #[test]
    fn test_center_point_visible() {
        let mut p = AnnotationProjector::new(Vec3::ZERO);
        p.on_resize(canvas());
        p.on_prerender(Some(Mat4::IDENTITY));

        let proj = p.projection();
        assert!(proj.visible);
        assert_eq!(proj.screen_position, Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(p.pixel_position(), Some(egui::pos2(200.0, 100.0)));
    }

    #[test]
    fn test_depth_outside_unit_range_hides() {
        // Identity projection: world z = 2.0 maps to depth 1.5, off the far end
        let mut p = AnnotationProjector::new(Vec3::new(0.0, 0.0, 2.0));
        p.on_resize(canvas());
        p.on_prerender(Some(Mat4::IDENTITY));
        assert!(!p.projection().visible);
        assert!(p.pixel_position().is_none());
    }

    #[test]
    fn test_offscreen_axis_hides() {
        // x lands at 5.5 in normalized space
        let mut p = AnnotationProjector::new(Vec3::new(10.0, 0.0, 0.0));
        p.on_resize(canvas());
        p.on_prerender(Some(Mat4::IDENTITY));
        assert!(!p.projection().visible);
    }

    #[test]
    fn test_perspective_camera_sees_anchor() {
        let mut p = AnnotationProjector::new(Vec3::ZERO);
        p.on_resize(canvas());

        let proj = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_4, 2.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        p.on_prerender(Some(proj * view));

        let result = p.projection();
        assert!(result.visible);
        // Anchor sits on the view axis: dead center of the canvas
        assert!((result.screen_position.x - 0.5).abs() < 1e-5);
        assert!((result.screen_position.y - 0.5).abs() < 1e-5);
        assert!(result.screen_position.z > 0.0 && result.screen_position.z < 1.0);
    }

    #[test]
    fn test_behind_camera_hides() {
        // Camera at origin looking down -Z; anchor behind it
        let mut p = AnnotationProjector::new(Vec3::new(0.0, 0.0, 10.0));
        p.on_resize(canvas());

        let proj = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_4, 2.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        p.on_prerender(Some(proj * view));
        assert!(!p.projection().visible);
    }

    #[test]
    fn test_resize_reprojects_without_new_tick() {
        let mut p = AnnotationProjector::new(Vec3::ZERO);
        p.on_resize(canvas());
        p.on_prerender(Some(Mat4::IDENTITY));
        assert_eq!(p.pixel_position(), Some(egui::pos2(200.0, 100.0)));

        // No new pre-render between these two calls
        p.on_resize(egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(400.0, 400.0)));
        assert_eq!(p.pixel_position(), Some(egui::pos2(200.0, 200.0)));
    }

    #[test]
    fn test_wired_to_bus() {
        let bus = EventBus::new();
        let projector = Arc::new(Mutex::new(AnnotationProjector::new(Vec3::ZERO)));
        AnnotationProjector::wire(&bus, Arc::clone(&projector));

        bus.emit(ViewportResizedEvent { canvas: canvas() });
        bus.emit(PreRenderEvent { view_proj: Some(Mat4::IDENTITY) });
        assert!(projector.lock().unwrap().projection().visible);

        bus.emit(PreRenderEvent { view_proj: None });
        assert!(!projector.lock().unwrap().projection().visible);
    }
}
