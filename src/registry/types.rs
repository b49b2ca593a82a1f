//! Registry record types
//!
//! Defines the file record handed out across the pipeline boundary and the
//! extension-derived media classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Media classification derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Unknown,
}

impl MediaKind {
    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Self {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return MediaKind::Unknown,
        };

        match ext.as_str() {
            "mp4" | "mkv" | "mov" | "avi" | "webm" | "flv" | "m4v" | "ts" => MediaKind::Video,
            "mp3" | "wav" | "aac" | "flac" | "ogg" | "m4a" | "opus" | "wma" => MediaKind::Audio,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "tiff" => MediaKind::Image,
            _ => MediaKind::Unknown,
        }
    }

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
            MediaKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered file and its cached metadata
///
/// The identifier is a fixed-width hash of the file's base name, so it is
/// stable across process restarts for the same name and never leaks the
/// underlying path to callers that only hold the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque identifier (16 hex chars)
    pub id: String,

    /// Absolute path to the file
    pub path: std::path::PathBuf,

    /// File size in bytes
    pub size: u64,

    /// Last modification time
    pub modified: DateTime<Utc>,

    /// Extension-derived classification
    pub media_kind: MediaKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_video_extensions() {
        for name in ["clip.mp4", "movie.MKV", "a.webm"] {
            assert_eq!(
                MediaKind::from_path(&PathBuf::from(name)),
                MediaKind::Video,
                "{} should classify as video",
                name
            );
        }
    }

    #[test]
    fn test_audio_extensions() {
        assert_eq!(
            MediaKind::from_path(&PathBuf::from("track.mp3")),
            MediaKind::Audio
        );
        assert_eq!(
            MediaKind::from_path(&PathBuf::from("voice.M4A")),
            MediaKind::Audio
        );
    }

    #[test]
    fn test_image_extensions() {
        assert_eq!(
            MediaKind::from_path(&PathBuf::from("frame.png")),
            MediaKind::Image
        );
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            MediaKind::from_path(&PathBuf::from("notes.txt")),
            MediaKind::Unknown
        );
        assert_eq!(
            MediaKind::from_path(&PathBuf::from("no_extension")),
            MediaKind::Unknown
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Unknown.to_string(), "unknown");
    }
}
