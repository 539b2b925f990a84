//! Publish dialog settings and session types.

use serde::{Deserialize, Serialize};

/// Message shown when publish is attempted without a login session.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to publish your scene.";

/// Publish settings (persistent via AppSettings)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublishSettings {
    pub title: String,
    pub description: String,
    /// Listed in the public gallery vs link-only.
    pub listed: bool,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            title: "Untitled scene".to_string(),
            description: String::new(),
            listed: true,
        }
    }
}

/// Authenticated user, as reported by the publish backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
}
