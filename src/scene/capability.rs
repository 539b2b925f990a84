//! Capability interface to the scene/renderer.
//!
//! The coordination core never owns the 3D scene; it talks to it through this
//! trait, injected at construction. Keeps the core testable and free of
//! ambient globals.

use crate::scene::camera::CameraPose;

/// Externally supplied scene handle.
pub trait SceneCapability: Send + Sync {
    /// Move the camera toward the given pose.
    fn set_camera_pose(&self, pose: &CameraPose);

    /// Mark the scene as needing a forced re-render.
    fn request_redraw(&self);
}
