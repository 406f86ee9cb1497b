use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What the media engine reports about a file
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,

    /// Native dimensions of the first video stream
    pub geometry: Geometry,

    /// Whether the file carries an audio stream
    pub has_audio: bool,
}

/// A probed source file. Immutable once probed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceClip {
    /// Path the media engine decodes from
    pub path: PathBuf,

    /// File name, used as the key in the start override file
    pub identifier: String,

    /// Probed metadata
    pub info: MediaInfo,
}

impl SourceClip {
    pub fn new<P: Into<PathBuf>>(path: P, info: MediaInfo) -> Self {
        let path = path.into();
        let identifier = identifier_for(&path);
        Self {
            path,
            identifier,
            info,
        }
    }

    pub fn duration(&self) -> f64 {
        self.info.duration
    }
}

/// The identifier of a clip is its file name, extension included
pub fn identifier_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A trimmed, resized window of a source clip.
///
/// `end - start` always equals the configured segment length. When the
/// source runs out early (`hold` overrun policy) the missing tail is
/// recorded in `hold` and filled by the engine with the last frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub path: PathBuf,
    pub identifier: String,
    pub start: f64,
    pub end: f64,
    pub geometry: Geometry,
    pub has_audio: bool,

    /// Seconds at the tail not covered by source material
    pub hold: f64,
}

impl Segment {
    /// Nominal length of the segment
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Seconds actually read from the source
    pub fn source_length(&self) -> f64 {
        self.length() - self.hold
    }
}
