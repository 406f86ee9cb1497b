//! Compiles a [`Timeline`] into an ffmpeg input list and filter graph.
//!
//! Every composite gets its own input, trimmed with input-side `-ss`/`-t`,
//! then a video chain (scale, hold, overlays, fade) and an audio chain
//! (resample, pad, fade). The chains are concatenated in timeline order.

use std::path::PathBuf;

use crate::error::{MediaError, Result};
use crate::overlay::{BoxSize, CompositeClip, OverlayLayer};
use crate::timeline::Timeline;

const AUDIO_SAMPLE_RATE: u32 = 48_000;

/// A compiled render plan ready for ffmpeg execution
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub inputs: Vec<RenderInput>,
    pub filter_graph: String,
    pub video_label: String,
    pub audio_label: String,
    pub duration: f64,
}

/// One `-i` input, already trimmed to the window the composite uses
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInput {
    pub path: PathBuf,
    pub seek: f64,
    pub duration: f64,
}

impl RenderInput {
    /// Input-side arguments for this file
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(6);
        if self.seek > 0.0 {
            args.push("-ss".to_string());
            args.push(format!("{:.3}", self.seek));
        }
        args.push("-t".to_string());
        args.push(format!("{:.3}", self.duration));
        args.push("-i".to_string());
        args.push(self.path.to_string_lossy().into_owned());
        args
    }
}

/// Compile a timeline into a render plan
pub fn compile(timeline: &Timeline, fps: u32) -> Result<RenderPlan> {
    if timeline.is_empty() {
        return Err(MediaError::RenderFailed {
            reason: "timeline has no elements".to_string(),
        }
        .into());
    }

    let mut inputs = Vec::with_capacity(timeline.len());
    let mut filters = Vec::with_capacity(timeline.len() * 2 + 1);
    let mut concat_inputs = String::new();

    for (i, element) in timeline.elements().iter().enumerate() {
        let base = element.base();
        inputs.push(RenderInput {
            path: base.path.clone(),
            seek: base.start,
            duration: base.source_duration(),
        });

        filters.push(video_chain(i, element, fps));
        filters.push(audio_chain(i, element));
        concat_inputs.push_str(&format!("[v{i}][a{i}]"));
    }

    filters.push(format!(
        "{concat_inputs}concat=n={}:v=1:a=1[outv][outa]",
        timeline.len()
    ));

    Ok(RenderPlan {
        inputs,
        filter_graph: filters.join(";\n"),
        video_label: "outv".to_string(),
        audio_label: "outa".to_string(),
        duration: timeline.total_duration(),
    })
}

fn video_chain(index: usize, element: &CompositeClip, fps: u32) -> String {
    let base = element.base();
    let duration = element.duration();

    let mut chain = vec![
        format!("scale={}:{}", base.geometry.width, base.geometry.height),
        "setsar=1".to_string(),
        format!("fps={fps}"),
        "format=yuv420p".to_string(),
        "setpts=PTS-STARTPTS".to_string(),
    ];
    if base.hold > 0.0 {
        chain.push(format!("tpad=stop_mode=clone:stop_duration={:.3}", base.hold));
    }
    chain.push(format!("trim=duration={duration:.3}"));

    for layer in element.layers() {
        chain.extend(layer_filters(layer));
    }

    if let Some(fade) = element.fade_out() {
        chain.push(format!("fade=t=out:st={:.3}:d={fade:.3}", duration - fade));
    }

    format!("[{index}:v]{}[v{index}]", chain.join(","))
}

fn audio_chain(index: usize, element: &CompositeClip) -> String {
    let duration = element.duration();

    let mut chain = if element.base().has_audio {
        vec![
            format!("[{index}:a]aresample={AUDIO_SAMPLE_RATE}"),
            "aformat=sample_fmts=fltp:channel_layouts=stereo".to_string(),
            "asetpts=PTS-STARTPTS".to_string(),
            "apad".to_string(),
        ]
    } else {
        vec![format!("anullsrc=r={AUDIO_SAMPLE_RATE}:cl=stereo")]
    };
    chain.push(format!("atrim=duration={duration:.3}"));

    if let Some(fade) = element.fade_out() {
        chain.push(format!("afade=t=out:st={:.3}:d={fade:.3}", duration - fade));
    }

    format!("{}[a{index}]", chain.join(","))
}

/// drawbox/drawtext filters for one overlay layer
fn layer_filters(layer: &OverlayLayer) -> Vec<String> {
    let margin = layer.margin;
    let right = layer.anchor.is_right();
    let bottom = layer.anchor.is_bottom();
    let enable = if layer.is_delayed() {
        format!(":enable='gte(t,{:.3})'", layer.delay)
    } else {
        String::new()
    };

    let mut filters = Vec::with_capacity(2);
    let (x, y, text_box) = match layer.background.as_ref().map(|b| (b, b.size)) {
        Some((background, BoxSize::Fixed { width, height })) => {
            let box_x = if right { format!("iw-{}", width + margin) } else { margin.to_string() };
            let box_y = if bottom { format!("ih-{}", height + margin) } else { margin.to_string() };
            filters.push(format!(
                "drawbox=x={box_x}:y={box_y}:w={width}:h={height}:color={}@{}:t=fill{enable}",
                background.color, background.opacity
            ));

            let text_x = if right {
                format!("w-{}+({width}-text_w)/2", width + margin)
            } else {
                format!("{margin}+({width}-text_w)/2")
            };
            let text_y = if bottom {
                format!("h-{}+({height}-text_h)/2", height + margin)
            } else {
                format!("{margin}+({height}-text_h)/2")
            };
            (text_x, text_y, String::new())
        }
        Some((background, BoxSize::Fit { padding })) => {
            let inset = margin + padding;
            let text_box = format!(
                ":box=1:boxcolor={}@{}:boxborderw={padding}",
                background.color, background.opacity
            );
            (edge_expr(right, "w-text_w", inset), edge_expr(bottom, "h-text_h", inset), text_box)
        }
        None => (
            edge_expr(right, "w-text_w", margin),
            edge_expr(bottom, "h-text_h", margin),
            String::new(),
        ),
    };

    let font_file = layer
        .style
        .font_file
        .as_ref()
        .map(|path| format!(":fontfile='{}'", escape_text(&path.to_string_lossy())))
        .unwrap_or_default();

    filters.push(format!(
        "drawtext=text='{}':expansion=none{font_file}:fontsize={}:fontcolor={}:x={x}:y={y}{text_box}{enable}",
        escape_text(&layer.text),
        layer.style.font_size,
        layer.style.color,
    ));
    filters
}

fn edge_expr(far_edge: bool, far_origin: &str, inset: u32) -> String {
    if far_edge {
        format!("{far_origin}-{inset}")
    } else {
        inset.to_string()
    }
}

/// Make text safe inside a single-quoted filter option
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' => escaped.push('\u{2019}'),
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::{Geometry, MediaInfo, Segment, SourceClip};
    use crate::config::OverlayConfig;
    use crate::media::{MediaEngine, RenderReport, RenderTarget};
    use crate::overlay::OverlayCompositor;
    use crate::timeline::TimelineAssembler;
    use std::path::Path;

    struct StaticEngine;

    impl MediaEngine for StaticEngine {
        fn supports_shared_reuse(&self) -> bool {
            true
        }

        fn probe(&self, _path: &Path) -> Result<MediaInfo> {
            unreachable!("shared transition is never re-probed")
        }

        async fn render(&self, _timeline: &Timeline, _target: &RenderTarget) -> Result<RenderReport> {
            unreachable!("filter tests never render")
        }
    }

    fn timeline(hold: f64) -> Timeline {
        let transition = SourceClip::new(
            "transition.avi",
            MediaInfo {
                duration: 5.0,
                geometry: Geometry::new(640, 480),
                has_audio: false,
            },
        );
        let segments = vec![
            Segment {
                path: PathBuf::from("source_video/it's_a_song.mp4"),
                identifier: "it's_a_song.mp4".to_string(),
                start: 100.0,
                end: 155.0,
                geometry: Geometry::new(1280, 720),
                has_audio: true,
                hold,
            },
            Segment {
                path: PathBuf::from("source_video/b.mp4"),
                identifier: "b.mp4".to_string(),
                start: 30.0,
                end: 85.0,
                geometry: Geometry::new(1280, 720),
                has_audio: true,
                hold: 0.0,
            },
        ];
        let compositor = OverlayCompositor::new(OverlayConfig::default(), 30.0);
        TimelineAssembler::new(compositor, 3.0, Geometry::new(1280, 720))
            .assemble(&StaticEngine, &transition, &segments)
            .unwrap()
    }

    #[test]
    fn test_one_input_per_element() {
        let plan = compile(&timeline(0.0), 24).unwrap();

        assert_eq!(plan.inputs.len(), 4);
        assert_eq!(plan.inputs[0].path, PathBuf::from("transition.avi"));
        assert_eq!(plan.inputs[2].path, PathBuf::from("transition.avi"));
        assert_eq!(plan.inputs[1].seek, 100.0);
        assert_eq!(plan.inputs[1].duration, 55.0);
        assert_eq!(plan.duration, 120.0);
    }

    #[test]
    fn test_input_args() {
        let plan = compile(&timeline(0.0), 24).unwrap();
        assert_eq!(plan.inputs[0].args(), vec!["-t", "5.000", "-i", "transition.avi"]);
        assert_eq!(
            plan.inputs[3].args(),
            vec!["-ss", "30.000", "-t", "55.000", "-i", "source_video/b.mp4"]
        );
    }

    #[test]
    fn test_concat_of_all_elements() {
        let plan = compile(&timeline(0.0), 24).unwrap();
        assert!(plan
            .filter_graph
            .ends_with("[v0][a0][v1][a1][v2][a2][v3][a3]concat=n=4:v=1:a=1[outv][outa]"));
        assert_eq!(plan.video_label, "outv");
    }

    #[test]
    fn test_content_chain() {
        let plan = compile(&timeline(0.0), 24).unwrap();
        let content = plan
            .filter_graph
            .split(";\n")
            .find(|chain| chain.starts_with("[1:v]"))
            .unwrap();

        assert!(content.contains("scale=1280:720,setsar=1,fps=24"));
        assert!(content.contains("trim=duration=55.000"));
        assert!(content.contains("drawbox=x=10:y=10:w=50:h=50:color=black@0.6:t=fill"));
        assert!(content.contains("text='1'"));
        assert!(content.contains("text='it\u{2019}s a song'"));
        assert!(content.contains("x=w-text_w-20:y=20"));
        assert!(content.contains(":enable='gte(t,30.000)'"));
        assert!(content.ends_with("fade=t=out:st=52.000:d=3.000[v1]"));
        assert!(!content.contains("tpad"));
    }

    #[test]
    fn test_transition_chain_has_no_fade_or_name() {
        let plan = compile(&timeline(0.0), 24).unwrap();
        let chains: Vec<&str> = plan.filter_graph.split(";\n").collect();

        let video = chains[0];
        assert!(video.starts_with("[0:v]"));
        assert!(video.contains("text='1'"));
        assert!(!video.contains("fade="));
        assert!(!video.contains("enable="));

        // transition has no audio stream
        let audio = chains[1];
        assert_eq!(audio, "anullsrc=r=48000:cl=stereo,atrim=duration=5.000[a0]");
    }

    #[test]
    fn test_content_audio_fades() {
        let plan = compile(&timeline(0.0), 24).unwrap();
        let audio = plan
            .filter_graph
            .split(";\n")
            .find(|chain| chain.starts_with("[1:a]"))
            .unwrap();
        assert!(audio.contains("apad,atrim=duration=55.000"));
        assert!(audio.ends_with("afade=t=out:st=52.000:d=3.000[a1]"));
    }

    #[test]
    fn test_held_segment_pads_video() {
        let plan = compile(&timeline(19.0), 24).unwrap();
        assert_eq!(plan.inputs[1].duration, 36.0);
        assert!(plan
            .filter_graph
            .contains("tpad=stop_mode=clone:stop_duration=19.000,trim=duration=55.000"));
    }

    #[test]
    fn test_empty_timeline_rejected() {
        assert!(compile(&Timeline::default(), 24).is_err());
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a'b"), "a\u{2019}b");
        assert_eq!(escape_text("back\\slash"), "back\\\\slash");
        assert_eq!(escape_text("tab\there"), "tabhere");
        assert_eq!(escape_text("Artist: Song"), "Artist\\: Song");
        assert_eq!(escape_text("C:/Fonts/a.ttf"), "C\\:/Fonts/a.ttf");
    }

    #[test]
    fn test_drawtext_colons_escaped() {
        use crate::overlay::{Anchor, TextStyle};

        let style = TextStyle {
            font_file: Some(PathBuf::from("C:/Fonts/a.ttf")),
            font_size: 36,
            color: "white".to_string(),
        };
        let layer = OverlayLayer::new("Artist: Song, Live", style, Anchor::TopRight);
        let filters = layer_filters(&layer);
        let drawtext = filters.last().unwrap();

        assert!(drawtext.contains("text='Artist\\: Song, Live'"));
        assert!(drawtext.contains("fontfile='C\\:/Fonts/a.ttf'"));
        assert!(!drawtext.contains("Artist: Song"));
    }
}
