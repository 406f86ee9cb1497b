use std::path::PathBuf;

use tracing::debug;

use crate::clips::{Geometry, Segment, SourceClip};
use crate::config::OverlayConfig;
use crate::error::Result;
use crate::media::MediaEngine;
use crate::overlay::layer::{Background, BoxSize, OverlayLayer, TextStyle};

/// Role of an element in the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipKind {
    Transition,
    Content,
}

/// The visual a composite is built on: a window of a media file
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub kind: ClipKind,
    pub path: PathBuf,
    pub identifier: String,

    /// Offset into the file where reading starts
    pub start: f64,

    /// Length of the visual on the timeline
    pub duration: f64,

    /// Tail of `duration` filled by holding the last frame
    pub hold: f64,

    pub geometry: Geometry,
    pub has_audio: bool,
}

impl Visual {
    /// A whole transition file, resized
    pub fn transition(clip: &SourceClip, geometry: Geometry) -> Self {
        Self {
            kind: ClipKind::Transition,
            path: clip.path.clone(),
            identifier: clip.identifier.clone(),
            start: 0.0,
            duration: clip.duration(),
            hold: 0.0,
            geometry,
            has_audio: clip.info.has_audio,
        }
    }

    /// Seconds read from the file
    pub fn source_duration(&self) -> f64 {
        self.duration - self.hold
    }
}

impl From<&Segment> for Visual {
    fn from(segment: &Segment) -> Self {
        Self {
            kind: ClipKind::Content,
            path: segment.path.clone(),
            identifier: segment.identifier.clone(),
            start: segment.start,
            duration: segment.length(),
            hold: segment.hold,
            geometry: segment.geometry,
            has_audio: segment.has_audio,
        }
    }
}

/// A base visual with overlay layers stacked on top, later layers drawn
/// last. Always as long as its base.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeClip {
    base: Visual,
    layers: Vec<OverlayLayer>,
    fade_out: Option<f64>,
}

impl CompositeClip {
    pub fn new(base: Visual) -> Self {
        Self {
            base,
            layers: Vec::new(),
            fade_out: None,
        }
    }

    pub fn with_layer(mut self, layer: OverlayLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Fade video and audio out over the last `seconds` of the clip
    pub fn with_fade_out(mut self, seconds: f64) -> Self {
        let seconds = seconds.clamp(0.0, self.duration());
        self.fade_out = (seconds > 0.0).then_some(seconds);
        self
    }

    pub fn base(&self) -> &Visual {
        &self.base
    }

    pub fn kind(&self) -> ClipKind {
        self.base.kind
    }

    pub fn layers(&self) -> &[OverlayLayer] {
        &self.layers
    }

    pub fn fade_out(&self) -> Option<f64> {
        self.fade_out
    }

    pub fn duration(&self) -> f64 {
        self.base.duration
    }
}

/// Builds the index and name overlays and stacks them onto base visuals
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    style: OverlayConfig,
    name_reveal_delay: f64,
}

impl OverlayCompositor {
    pub fn new(style: OverlayConfig, name_reveal_delay: f64) -> Self {
        Self {
            style,
            name_reveal_delay,
        }
    }

    fn text_style(&self) -> TextStyle {
        TextStyle {
            font_file: self.style.font_file.clone(),
            font_size: self.style.font_size,
            color: self.style.text_color.clone(),
        }
    }

    fn background(&self, size: BoxSize) -> Background {
        Background {
            color: self.style.box_color.clone(),
            opacity: self.style.box_opacity,
            size,
        }
    }

    /// 1-based clip number, pinned to the same corner for the whole program
    pub fn index_overlay(&self, position: usize) -> OverlayLayer {
        let (width, height) = self.style.index_box;
        OverlayLayer::new(position.to_string(), self.text_style(), self.style.index_anchor)
            .with_background(self.background(BoxSize::Fixed { width, height }))
            .with_margin(self.style.margin)
    }

    /// Clip name in the opposite corner, revealed part-way into the clip
    pub fn name_overlay(&self, identifier: &str) -> OverlayLayer {
        OverlayLayer::new(
            display_name(identifier),
            self.text_style(),
            self.style.index_anchor.opposite(),
        )
        .with_background(self.background(BoxSize::Fit { padding: 10 }))
        .with_margin(self.style.margin)
        .with_delay(self.name_reveal_delay)
    }

    /// Stack layers onto a base in order
    pub fn compose<I>(&self, base: Visual, layers: I) -> CompositeClip
    where
        I: IntoIterator<Item = OverlayLayer>,
    {
        layers
            .into_iter()
            .fold(CompositeClip::new(base), CompositeClip::with_layer)
    }

    /// Base visual for the transition before clip `position`.
    ///
    /// Engines that cannot reuse one decoded handle across composites get
    /// a freshly probed transition every time.
    pub fn transition_base<E: MediaEngine + ?Sized>(
        &self,
        engine: &E,
        transition: &SourceClip,
        geometry: Geometry,
    ) -> Result<Visual> {
        if engine.supports_shared_reuse() {
            return Ok(Visual::transition(transition, geometry));
        }

        debug!("Re-probing transition {:?}", transition.path);
        let info = engine.probe(&transition.path)?;
        let fresh = SourceClip::new(transition.path.clone(), info);
        Ok(Visual::transition(&fresh, geometry))
    }
}

/// Human-readable clip name: file stem with underscores turned into spaces
pub fn display_name(identifier: &str) -> String {
    let file_name = identifier
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(identifier);
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };

    stem.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
