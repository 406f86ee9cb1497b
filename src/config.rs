use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    clips::Geometry,
    error::{ConfigError, Result},
    overlay::Anchor,
};

/// Main configuration for the power hour generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output video settings
    pub output: OutputConfig,

    /// Program timing settings
    pub timing: TimingConfig,

    /// On-screen overlay styling
    pub overlay: OverlayConfig,

    /// Start override file parsing
    pub overrides: OverridesConfig,

    /// External tool locations
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.timing.validate()?;
        self.overlay.validate()?;
        self.overrides.validate()?;
        Ok(())
    }
}

/// Output video configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Output frame rate
    pub fps: u32,

    /// Video codec passed to the encoder
    pub codec: String,

    /// Audio codec passed to the encoder
    pub audio_codec: String,

    /// Encoder threads
    pub threads: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 24,
            codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            threads: num_cpus::get(),
        }
    }
}

impl OutputConfig {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output.resolution".to_string(),
                value: format!("{}x{}", self.width, self.height),
            }
            .into());
        }

        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output.fps".to_string(),
                value: self.fps.to_string(),
            }
            .into());
        }

        if self.codec.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output.codec".to_string(),
                value: self.codec.clone(),
            }
            .into());
        }

        Ok(())
    }
}

/// What to do when a source clip cannot supply a full segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Abort the run with a segment-too-long error
    #[default]
    Fail,
    /// Hold the last available frame (and pad silence) for the missing tail
    Hold,
}

/// Program timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Length of one transition + content pairing (seconds)
    pub slot_seconds: f64,

    /// Fade-out applied to the tail of every content clip (seconds)
    pub fade_padding: f64,

    /// Offset into a content clip at which its name appears (seconds)
    pub name_reveal_delay: f64,

    /// Transitions longer than this produce a warning (seconds)
    pub transition_warn_threshold: f64,

    /// Behavior for clips too short for their segment
    pub overrun: OverrunPolicy,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            slot_seconds: 60.0,
            fade_padding: 3.0,
            name_reveal_delay: 30.0,
            transition_warn_threshold: 6.0,
            overrun: OverrunPolicy::Fail,
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<()> {
        if !(self.slot_seconds.is_finite() && self.slot_seconds > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "timing.slot_seconds".to_string(),
                value: self.slot_seconds.to_string(),
            }
            .into());
        }

        for (key, value) in [
            ("timing.fade_padding", self.fade_padding),
            ("timing.name_reveal_delay", self.name_reveal_delay),
            ("timing.transition_warn_threshold", self.transition_warn_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Overlay styling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Font file for overlay text; the engine default when unset
    pub font_file: Option<PathBuf>,

    /// Font size in pixels
    pub font_size: u32,

    /// Text color (engine color name or hex)
    pub text_color: String,

    /// Background box color
    pub box_color: String,

    /// Background box opacity (0.0-1.0)
    pub box_opacity: f32,

    /// Fixed box size for the index overlay (width, height)
    pub index_box: (u32, u32),

    /// Distance from the frame edge in pixels
    pub margin: u32,

    /// Where the index overlay sits; the name overlay takes the opposite corner
    pub index_anchor: Anchor,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_file: None,
            font_size: 36,
            text_color: "white".to_string(),
            box_color: "black".to_string(),
            box_opacity: 0.6,
            index_box: (50, 50),
            margin: 10,
            index_anchor: Anchor::TopLeft,
        }
    }
}

impl OverlayConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.box_opacity) {
            return Err(ConfigError::InvalidValue {
                key: "overlay.box_opacity".to_string(),
                value: self.box_opacity.to_string(),
            }
            .into());
        }

        if self.font_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "overlay.font_size".to_string(),
                value: self.font_size.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Start override file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverridesConfig {
    /// Field delimiter for `name<delimiter>seconds` rows
    pub delimiter: char,
}

impl Default for OverridesConfig {
    fn default() -> Self {
        Self { delimiter: '|' }
    }
}

impl OverridesConfig {
    fn validate(&self) -> Result<()> {
        if self.delimiter.is_whitespace() || self.delimiter == '#' {
            return Err(ConfigError::InvalidValue {
                key: "overrides.delimiter".to_string(),
                value: format!("{:?}", self.delimiter),
            }
            .into());
        }
        Ok(())
    }
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output.geometry(), Geometry::new(1280, 720));
        assert_eq!(config.output.fps, 24);
        assert_eq!(config.overrides.delimiter, '|');
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("power_hour.toml");

        let mut original_config = Config::default();
        original_config.timing.overrun = OverrunPolicy::Hold;
        original_config.overlay.index_anchor = Anchor::BottomRight;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.output.width, original_config.output.width);
        assert_eq!(loaded_config.timing.overrun, OverrunPolicy::Hold);
        assert_eq!(loaded_config.overlay.index_anchor, Anchor::BottomRight);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(
            &file_path,
            "[output]\nwidth = 1920\nheight = 1080\n\n[timing]\noverrun = \"hold\"\n",
        )
        .unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.output.geometry(), Geometry::new(1920, 1080));
        assert_eq!(config.output.fps, 24);
        assert_eq!(config.timing.slot_seconds, 60.0);
        assert_eq!(config.timing.overrun, OverrunPolicy::Hold);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(dir.path().join("nope.toml"));
        assert!(matches!(
            result,
            Err(crate::PowerHourError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_opacity() {
        let mut config = Config::default();
        config.overlay.box_opacity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_delimiter() {
        let mut config = Config::default();
        config.overrides.delimiter = '#';
        assert!(config.validate().is_err());

        config.overrides.delimiter = ' ';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let mut config = Config::default();
        config.output.height = 0;
        assert!(config.validate().is_err());
    }
}
