//! Camera poses, presets and the scene capability seam.

pub mod camera;
pub mod camera_events;
pub mod capability;

pub use camera::{CameraPose, CameraPresetController, CameraRig, Easing};
pub use capability::SceneCapability;
