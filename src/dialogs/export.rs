//! Export settings: containers, codecs, output naming.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Video container format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Container {
    Webm,
    Mov,
    Mkv,
    Mp4,
}

impl Container {
    pub fn all() -> &'static [Container] {
        &[Container::Mp4, Container::Webm, Container::Mov, Container::Mkv]
    }

    /// Parse a requested format string; anything unrecognized falls back to MP4.
    pub fn from_format(format: &str) -> Self {
        match format.to_ascii_lowercase().as_str() {
            "webm" => Container::Webm,
            "mov" => Container::Mov,
            "mkv" => Container::Mkv,
            _ => Container::Mp4,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Container::Webm => "webm",
            Container::Mov => "mov",
            Container::Mkv => "mkv",
            Container::Mp4 => "mp4",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Container::Webm => "video/webm",
            Container::Mov => "video/quicktime",
            Container::Mkv => "video/x-matroska",
            Container::Mp4 => "video/mp4",
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Webm => write!(f, "WebM"),
            Container::Mov => write!(f, "MOV"),
            Container::Mkv => write!(f, "MKV"),
            Container::Mp4 => write!(f, "MP4"),
        }
    }
}

/// Display name for a codec identifier; unknown codecs show upper-cased.
pub fn codec_label(codec: &str) -> String {
    match codec.to_ascii_lowercase().as_str() {
        "h264" => "H.264".to_string(),
        "h265" => "H.265".to_string(),
        "vp9" => "VP9".to_string(),
        "av1" => "AV1".to_string(),
        _ => codec.to_ascii_uppercase(),
    }
}

/// Codec identifiers offered in the export dialog, in menu order.
pub fn known_codecs() -> &'static [&'static str] {
    &["h264", "h265", "vp9", "av1"]
}

/// Suggested output file name: document name with its extension swapped for
/// the container's. An unusable document name falls back to "untitled".
pub fn suggested_output_name(doc_name: &str, container: Container) -> String {
    let stem = Path::new(doc_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("untitled");
    format!("{}.{}", stem, container.extension())
}

/// Image export settings (persistent via AppSettings)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageExportSettings {
    pub width: u32,
    pub height: u32,
    pub transparent_background: bool,
}

impl Default for ImageExportSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            transparent_background: false,
        }
    }
}

/// Video export settings (persistent via AppSettings)
///
/// Format and codec stay free-form strings: the dialog offers the known set,
/// but the flow must gracefully absorb anything a saved settings file or a
/// scripted caller feeds it (unknown formats fall back to MP4).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoExportSettings {
    pub format: String,
    pub codec: String,
    pub fps: f32,
    pub duration_secs: f32,
}

impl Default for VideoExportSettings {
    fn default() -> Self {
        Self {
            format: "mp4".to_string(),
            codec: "h264".to_string(),
            fps: 30.0,
            duration_secs: 5.0,
        }
    }
}
