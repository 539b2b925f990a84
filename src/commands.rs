//! Bus command contracts between the shell and the dialog flows.
//!
//! Each command has exactly one handler, registered by whichever side owns
//! the behavior: the shell registers the UI-facing ones (popups, document
//! name), the application backend registers publish/render.

use std::path::PathBuf;

use crate::core::command_hub::Command;
use crate::dialogs::export::{ImageExportSettings, VideoExportSettings};
use crate::dialogs::publish::{PublishSettings, UserProfile};

/// Popup severity, drives icon/color in the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupKind {
    Info,
    Error,
}

/// Show a notification popup; returns once it is queued for display.
#[derive(Clone, Debug)]
pub struct ShowPopupCommand {
    pub kind: PopupKind,
    pub header: String,
    pub message: String,
}

impl Command for ShowPopupCommand {
    type Output = ();
    fn name() -> &'static str {
        "ui.showPopup"
    }
}

/// Query the current login session; None while unauthenticated.
#[derive(Clone, Debug)]
pub struct UserStatusCommand;

impl Command for UserStatusCommand {
    type Output = Option<UserProfile>;
    fn name() -> &'static str {
        "publish.userStatus"
    }
}

/// Publish the current scene with the confirmed settings.
#[derive(Clone, Debug)]
pub struct PublishSceneCommand {
    pub settings: PublishSettings,
}

impl Command for PublishSceneCommand {
    type Output = ();
    fn name() -> &'static str {
        "scene.publish"
    }
}

/// Render a still image of the current view.
#[derive(Clone, Debug)]
pub struct RenderImageCommand {
    pub settings: ImageExportSettings,
}

impl Command for RenderImageCommand {
    type Output = ();
    fn name() -> &'static str {
        "render.image"
    }
}

/// Render a video turntable; destination is None when the host offered none.
#[derive(Clone, Debug)]
pub struct RenderVideoCommand {
    pub settings: VideoExportSettings,
    pub destination: Option<PathBuf>,
}

impl Command for RenderVideoCommand {
    type Output = ();
    fn name() -> &'static str {
        "render.video"
    }
}

/// Name of the currently open document, extension included.
#[derive(Clone, Debug)]
pub struct DocNameCommand;

impl Command for DocNameCommand {
    type Output = String;
    fn name() -> &'static str {
        "doc.name"
    }
}
