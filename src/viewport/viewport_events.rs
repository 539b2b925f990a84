//! Viewport events.

use eframe::egui;
use glam::Mat4;

/// Fired once per frame before the viewport is drawn.
///
/// Carries the current view-projection matrix, or None while the camera is
/// not ready (scene still loading, renderer restarting). Camera-dependent
/// overlays subscribe here so they all observe the same per-frame snapshot.
#[derive(Clone, Debug)]
pub struct PreRenderEvent {
    pub view_proj: Option<Mat4>,
}

/// Fired when the viewport canvas rect changes (window resize, panel drag).
///
/// Overlays anchored in screen space must not wait for the next pre-render
/// tick to follow a resize.
#[derive(Clone, Debug)]
pub struct ViewportResizedEvent {
    pub canvas: egui::Rect,
}
