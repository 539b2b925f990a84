//! Save-destination host seam.
//!
//! The video flow asks the host environment for a write destination. The
//! host may be headless (no picker available) or the user may dismiss the
//! picker; both are normal results, not errors, and the flow treats them
//! differently: Unavailable renders without a destination, Cancelled ends
//! the flow silently.

use std::path::PathBuf;

/// Result of asking the host for a write destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestinationChoice {
    Selected(PathBuf),
    /// User dismissed the picker.
    Cancelled,
    /// No picker in this environment.
    Unavailable,
}

/// Externally supplied destination picker.
pub trait SaveDestinationHost: Send + Sync {
    fn pick_save_destination(&self, suggested_name: &str, extension: &str) -> DestinationChoice;
}

/// Native picker backed by rfd.
#[derive(Debug, Default)]
pub struct RfdSaveHost;

impl SaveDestinationHost for RfdSaveHost {
    fn pick_save_destination(&self, suggested_name: &str, extension: &str) -> DestinationChoice {
        match rfd::FileDialog::new()
            .set_title("Save video as")
            .set_file_name(suggested_name)
            .add_filter(extension.to_ascii_uppercase(), &[extension])
            .save_file()
        {
            Some(path) => DestinationChoice::Selected(path),
            None => DestinationChoice::Cancelled,
        }
    }
}
