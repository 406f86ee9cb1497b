use std::fmt;

use thiserror::Error;

/// Main error type for the power hour library
#[derive(Error, Debug)]
pub enum PowerHourError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Clip error: {0}")]
    Clip(#[from] ClipError),

    #[error("Media engine error: {0}")]
    Media(#[from] MediaError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors, both for the start override file and
/// the TOML settings file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed config line {line_number} in {path}: {reason} (line: {line:?})")]
    Format {
        path: String,
        line_number: usize,
        line: String,
        reason: String,
    },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Per-clip selection errors
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("Video {identifier} contains config delimiter character {delimiter:?}")]
    InvalidName { identifier: String, delimiter: char },

    #[error(
        "Segment {start:.3}s-{end:.3}s of {identifier} exceeds its duration of {duration:.3}s"
    )]
    SegmentTooLong {
        identifier: String,
        start: f64,
        end: f64,
        duration: f64,
    },

    #[error("Transition lasts {duration:.3}s, leaving no room in a {slot:.3}s slot")]
    TransitionTooLong { duration: f64, slot: f64 },
}

/// Failures reported by the external media engine. Never retried.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("{tool} not found. Please install FFmpeg.")]
    ToolNotFound { tool: String },

    #[error("Failed to probe {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Render failed: {reason}")]
    RenderFailed { reason: String },
}

/// Pipeline-level errors
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("No video clips found in directory: {path}")]
    NoClipsFound { path: String },
}

/// Convenience type alias for Results using PowerHourError
pub type Result<T> = std::result::Result<T, PowerHourError>;

impl PowerHourError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(ConfigError::Format {
                path,
                line_number,
                line,
                reason,
            }) => {
                format!(
                    "Config file '{}' line {}: {}.\n    {}\nExpected `<video name><delimiter><start seconds>`.",
                    path, line_number, reason, line
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Clip(ClipError::InvalidName {
                identifier,
                delimiter,
            }) => {
                format!(
                    "Video '{}' contains config delimiter character '{}'. To correct, either rename the video or change the delimiter.",
                    identifier, delimiter
                )
            }
            Self::Clip(ClipError::SegmentTooLong {
                identifier,
                start,
                end,
                duration,
            }) => {
                format!(
                    "Video '{}' is too short: a segment from {:.2}s to {:.2}s does not fit in {:.2}s. Pick an earlier start in the config file or use `overrun = \"hold\"`.",
                    identifier, start, end, duration
                )
            }
            Self::Media(MediaError::ToolNotFound { tool }) => {
                format!("Could not run '{}'. Please check FFmpeg is installed and on PATH.", tool)
            }
            _ => self.to_string(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Clip(_) | Self::Composition(_) => 2,
            Self::Media(_) => 3,
            Self::Io(_) => 1,
        }
    }
}

/// A resized clip whose geometry differs from the configured output.
///
/// Not an error: it is logged and the batch continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeMismatch {
    pub requested: (u32, u32),
    pub actual: (u32, u32),
}

impl fmt::Display for ResizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resized to {}x{} instead of {}x{}",
            self.actual.0, self.actual.1, self.requested.0, self.requested.1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_names_line() {
        let err: PowerHourError = ConfigError::Format {
            path: "power_hour.cfg".to_string(),
            line_number: 4,
            line: "clip2.mp4".to_string(),
            reason: "expected 2 fields, found 1".to_string(),
        }
        .into();

        let message = err.user_message();
        assert!(message.contains("line 4"));
        assert!(message.contains("clip2.mp4"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_media_errors_have_distinct_exit_code() {
        let err: PowerHourError = MediaError::RenderFailed {
            reason: "boom".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_resize_mismatch_display() {
        let mismatch = ResizeMismatch {
            requested: (1281, 721),
            actual: (1280, 720),
        };
        assert_eq!(mismatch.to_string(), "resized to 1280x720 instead of 1281x721");
    }
}
