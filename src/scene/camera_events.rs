//! Camera events.

use crate::scene::camera::CameraPose;

/// Fire-and-forget request to move the camera to a pose.
#[derive(Clone, Debug)]
pub struct SetCameraPoseEvent {
    pub pose: CameraPose,
}
