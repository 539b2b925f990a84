//! SCENEDECK - 3D scene editor shell library
//!
//! Re-exports all modules for use by binary targets.

// Core bus (events + commands)
pub mod core;

// App modules
pub mod cli;
pub mod commands;
pub mod config;
pub mod dialogs;
pub mod overlay;
pub mod scene;
pub mod viewport;

// Re-export commonly used types from core
pub use core::command_hub::{Command, CommandError, CommandHub};
pub use core::event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter, Subscription};

// Re-export component entry points
pub use dialogs::{DialogKind, DialogOrchestrator, DialogOutcome, DialogTicket};
pub use overlay::OverlayState;
pub use scene::{CameraPose, CameraPresetController, CameraRig, Easing, SceneCapability};
pub use viewport::{AnnotationProjection, AnnotationProjector};
