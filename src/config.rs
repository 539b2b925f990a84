//! Settings persistence: platform config dir resolution + JSON load/save.

use std::fs;
use std::path::PathBuf;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::dialogs::export::{ImageExportSettings, VideoExportSettings};
use crate::dialogs::publish::PublishSettings;

pub const SETTINGS_FILE: &str = "settings.json";

/// Resolved filesystem locations for this instance.
///
/// Priority: CLI flag > SCENEDECK_CONFIG_DIR > platform config dir > cwd.
#[derive(Clone, Debug)]
pub struct PathConfig {
    pub config_dir: PathBuf,
}

impl PathConfig {
    pub fn from_env_and_cli(cli_override: Option<PathBuf>) -> Self {
        let config_dir = cli_override
            .or_else(|| std::env::var_os("SCENEDECK_CONFIG_DIR").map(PathBuf::from))
            .or_else(|| dirs_next::config_dir().map(|d| d.join("scenedeck")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self { config_dir }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

/// Application settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // Last-used dialog settings, restored on the next session
    pub publish: PublishSettings,
    pub image_export: ImageExportSettings,
    pub video_export: VideoExportSettings,

    // UI
    pub dark_mode: bool,
    pub show_annotation: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            publish: PublishSettings::default(),
            image_export: ImageExportSettings::default(),
            video_export: VideoExportSettings::default(),
            dark_mode: true,
            show_annotation: true,
        }
    }
}

impl AppSettings {
    /// Load settings, falling back to defaults on a missing or broken file.
    pub fn load(paths: &PathConfig) -> Self {
        let path = paths.settings_path();
        match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(settings) => {
                    info!("Settings loaded from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No settings file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, paths: &PathConfig) -> anyhow::Result<()> {
        let path = paths.settings_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_paths() -> PathConfig {
        let dir = std::env::temp_dir().join(format!("scenedeck-test-{}", uuid::Uuid::new_v4()));
        PathConfig { config_dir: dir }
    }

    #[test]
    fn test_load_missing_returns_defaults() {
        let paths = temp_paths();
        let settings = AppSettings::load(&paths);
        assert!(settings.dark_mode);
        assert_eq!(settings.video_export.format, "mp4");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let paths = temp_paths();
        let mut settings = AppSettings::default();
        settings.video_export.format = "mkv".to_string();
        settings.publish.title = "Demo".to_string();
        settings.save(&paths).unwrap();

        let loaded = AppSettings::load(&paths);
        assert_eq!(loaded.video_export.format, "mkv");
        assert_eq!(loaded.publish.title, "Demo");

        std::fs::remove_dir_all(&paths.config_dir).ok();
    }

    #[test]
    fn test_broken_file_falls_back() {
        let paths = temp_paths();
        std::fs::create_dir_all(&paths.config_dir).unwrap();
        std::fs::write(paths.settings_path(), "{not json").unwrap();

        let settings = AppSettings::load(&paths);
        assert_eq!(settings.video_export.format, "mp4");

        std::fs::remove_dir_all(&paths.config_dir).ok();
    }
}
