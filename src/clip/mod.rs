//! Clip descriptors derived from Outplayed-style filenames

pub mod filename;

pub use filename::parse_clip_filename;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lifecycle tag attached to a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipStatus {
    Processing,
    Ready,
    Published,
    Error,
}

/// Structured information extracted from a clip's filename.
///
/// A filename that does not follow the `Game_MM-DD-YYYY_H-M-S-ms.ext` convention
/// still yields a descriptor; only `original_filename` is set in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDescriptor {
    /// Game name with underscores replaced by spaces
    pub game_name: Option<String>,

    /// Raw capture date (`MM-DD-YYYY`)
    pub date: Option<String>,

    /// Raw capture time (`H-M-S-fraction`)
    pub time: Option<String>,

    /// Capture time, unset when any component is out of range
    pub timestamp: Option<NaiveDateTime>,

    /// File extension without the dot
    pub extension: Option<String>,

    original_filename: String,

    /// Location on disk, once known
    pub file_path: Option<PathBuf>,

    /// Size in bytes, once known
    pub file_size: Option<u64>,

    pub status: Option<ClipStatus>,
}

impl ClipDescriptor {
    /// Descriptor for a filename that did not match the naming convention
    pub fn unparsed(original_filename: impl Into<String>) -> Self {
        Self {
            game_name: None,
            date: None,
            time: None,
            timestamp: None,
            extension: None,
            original_filename: original_filename.into(),
            file_path: None,
            file_size: None,
            status: None,
        }
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    /// True when the filename matched the naming convention
    pub fn is_recognized(&self) -> bool {
        self.game_name.is_some()
    }

    /// Attach on-disk location and size
    pub fn with_file_info(mut self, path: &Path, size: u64) -> Self {
        self.file_path = Some(path.to_path_buf());
        self.file_size = Some(size);
        self
    }

    pub fn with_status(mut self, status: ClipStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Identifier handed to persistence sinks: the file path when known,
    /// otherwise the original filename
    pub fn clip_id(&self) -> String {
        match &self.file_path {
            Some(path) => path.display().to_string(),
            None => self.original_filename.clone(),
        }
    }
}
