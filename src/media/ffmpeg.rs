use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::Local;
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::clips::{Geometry, MediaInfo};
use crate::config::ToolsConfig;
use crate::error::{MediaError, PowerHourError, Result};
use crate::media::filter::{compile, RenderPlan};
use crate::media::{MediaEngine, RenderReport, RenderTarget};
use crate::timeline::Timeline;

/// Media engine backed by the external `ffmpeg` and `ffprobe` tools.
///
/// Each composite is fed by its own trimmed input, so probed handles are
/// never shared between composites.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegEngine {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
        }
    }

    /// Fail early when either tool cannot be run
    pub fn check_available(&self) -> Result<()> {
        for tool in [&self.ffmpeg, &self.ffprobe] {
            let status = Command::new(tool)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();

            match status {
                Ok(status) if status.success() => {}
                _ => {
                    return Err(MediaError::ToolNotFound {
                        tool: tool.display().to_string(),
                    }
                    .into())
                }
            }
        }
        Ok(())
    }

    fn tool_error(tool: &Path, error: std::io::Error) -> PowerHourError {
        if error.kind() == std::io::ErrorKind::NotFound {
            MediaError::ToolNotFound {
                tool: tool.display().to_string(),
            }
            .into()
        } else {
            error.into()
        }
    }

    /// Full ffmpeg argument list for a compiled plan
    pub fn build_args(plan: &RenderPlan, target: &RenderTarget, script: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
        ];

        for input in &plan.inputs {
            args.extend(input.args());
        }

        args.extend([
            "-filter_complex_script".to_string(),
            script.to_string_lossy().into_owned(),
            "-map".to_string(),
            format!("[{}]", plan.video_label),
            "-map".to_string(),
            format!("[{}]", plan.audio_label),
            "-c:v".to_string(),
            target.codec.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            target.fps.to_string(),
            "-c:a".to_string(),
            target.audio_codec.clone(),
            "-threads".to_string(),
            target.threads.to_string(),
            target.output.to_string_lossy().into_owned(),
        ]);

        args
    }
}

impl MediaEngine for FfmpegEngine {
    fn supports_shared_reuse(&self) -> bool {
        false
    }

    fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .map_err(|e| Self::tool_error(&self.ffprobe, e))?;

        if !output.status.success() {
            return Err(MediaError::ProbeFailed {
                path: path.display().to_string(),
                reason: format!("ffprobe exited with {}", output.status),
            }
            .into());
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let info = parse_probe_output(path, &json)?;
        debug!(
            "Probed {:?}: {:.3}s, {}, audio: {}",
            path, info.duration, info.geometry, info.has_audio
        );
        Ok(info)
    }

    /// yuv420p needs even dimensions
    fn output_geometry(&self, requested: Geometry) -> Geometry {
        Geometry::new(
            (requested.width & !1).max(2),
            (requested.height & !1).max(2),
        )
    }

    async fn render(&self, timeline: &Timeline, target: &RenderTarget) -> Result<RenderReport> {
        let plan = compile(timeline, target.fps)?;
        info!(
            "Rendering {} elements ({:.1}s) to {:?}",
            plan.inputs.len(),
            plan.duration,
            target.output
        );

        let scratch = scratch_dir()?;
        let script = scratch.path().join("filter_graph.txt");
        tokio::fs::write(&script, &plan.filter_graph).await?;
        debug!("Filter graph written to {:?}", script);

        let args = Self::build_args(&plan, target, &script);
        let output = tokio::process::Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Self::tool_error(&self.ffmpeg, e))?;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!("Failed to remove temporary directory {:?}: {}", scratch_path, e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::RenderFailed {
                reason: format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
            }
            .into());
        }

        let metadata = tokio::fs::metadata(&target.output).await?;
        Ok(RenderReport {
            path: target.output.clone(),
            duration: plan.duration,
            frame_count: (plan.duration * target.fps as f64).round() as u64,
            file_size: metadata.len(),
            finished_at: Local::now(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output
pub fn parse_probe_output(path: &Path, json: &str) -> Result<MediaInfo> {
    let failed = |reason: String| MediaError::ProbeFailed {
        path: path.display().to_string(),
        reason,
    };

    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| failed(format!("invalid ffprobe output: {e}")))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| failed("no video stream".to_string()))?;
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| failed("unknown duration".to_string()))?;

    let geometry = match (video.width, video.height) {
        (Some(width), Some(height)) => Geometry::new(width, height),
        _ => return Err(failed("unknown frame size".to_string()).into()),
    };

    Ok(MediaInfo {
        duration,
        geometry,
        has_audio,
    })
}

/// Scratch directory for render intermediates, unique per render and
/// removed when dropped
fn scratch_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("power_hour_").tempdir()?)
}
