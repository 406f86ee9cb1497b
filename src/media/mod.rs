//! # Media Engine
//!
//! Everything that touches decoded media goes through [`MediaEngine`]:
//! probing files, deciding output geometry and rendering the assembled
//! timeline. The default implementation drives the `ffmpeg` and
//! `ffprobe` command-line tools.

pub mod ffmpeg;
pub mod filter;

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::clips::{Geometry, MediaInfo};
use crate::config::Config;
use crate::error::Result;
use crate::timeline::Timeline;

pub use ffmpeg::FfmpegEngine;
pub use filter::{compile, RenderInput, RenderPlan};

/// External decoder/encoder the pipeline delegates to
pub trait MediaEngine {
    /// Whether one probed handle can back several composites at once.
    ///
    /// When false, the overlay compositor probes the transition again for
    /// every composite it builds on it.
    fn supports_shared_reuse(&self) -> bool;

    /// Read duration, dimensions and stream layout of a file
    fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Dimensions the engine will actually produce when asked to resize
    fn output_geometry(&self, requested: Geometry) -> Geometry {
        requested
    }

    /// Concatenate the timeline into one stream and write it out
    fn render(&self, timeline: &Timeline, target: &RenderTarget) -> impl Future<Output = Result<RenderReport>>;
}

/// Where and how the final video is written
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    pub output: PathBuf,
    pub fps: u32,
    pub codec: String,
    pub audio_codec: String,
    pub threads: usize,
}

impl RenderTarget {
    pub fn from_config<P: Into<PathBuf>>(output: P, config: &Config) -> Self {
        Self {
            output: output.into(),
            fps: config.output.fps,
            codec: config.output.codec.clone(),
            audio_codec: config.output.audio_codec.clone(),
            threads: config.output.threads,
        }
    }
}

/// Summary of a finished render
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub path: PathBuf,
    pub duration: f64,
    pub frame_count: u64,
    pub file_size: u64,
    pub finished_at: DateTime<Local>,
}
