use std::fmt;

use tracing::{debug, info, warn};

use crate::clips::{Geometry, Segment, SourceClip};
use crate::error::Result;
use crate::media::MediaEngine;
use crate::overlay::{display_name, ClipKind, CompositeClip, OverlayCompositor, Visual};

/// Ordered program: transition, content, transition, content, ...
///
/// Built once by [`TimelineAssembler`], consumed once by rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    elements: Vec<CompositeClip>,
}

impl Timeline {
    pub fn elements(&self) -> &[CompositeClip] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of content clips in the program
    pub fn content_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|element| element.kind() == ClipKind::Content)
            .count()
    }

    /// Sum of element durations; elements butt up with no gap
    pub fn total_duration(&self) -> f64 {
        self.elements.iter().map(CompositeClip::duration).sum()
    }

    /// `(start, end)` of every element on the output timeline
    pub fn boundaries(&self) -> Vec<(f64, f64)> {
        let mut cursor = 0.0;
        self.elements
            .iter()
            .map(|element| {
                let span = (cursor, cursor + element.duration());
                cursor = span.1;
                span
            })
            .collect()
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (element, (start, end)) in self.elements.iter().zip(self.boundaries()) {
            let base = element.base();
            let kind = match element.kind() {
                ClipKind::Transition => "transition",
                ClipKind::Content => "content",
            };
            write!(
                f,
                "{:>9.3}s - {:>9.3}s  {:<10} {} [{:.3}s +{:.3}s]",
                start,
                end,
                kind,
                base.identifier,
                base.start,
                base.source_duration()
            )?;
            if base.hold > 0.0 {
                write!(f, " hold {:.3}s", base.hold)?;
            }
            for layer in element.layers() {
                write!(f, " \"{}\"", layer.text)?;
                if layer.is_delayed() {
                    write!(f, "@{:.1}s", layer.delay)?;
                }
            }
            if let Some(fade) = element.fade_out() {
                write!(f, " fade {:.1}s", fade)?;
            }
            writeln!(f)?;
        }
        write!(f, "total {:.3}s in {} elements", self.total_duration(), self.len())
    }
}

/// Interleaves numbered transitions with content segments
#[derive(Debug, Clone)]
pub struct TimelineAssembler {
    compositor: OverlayCompositor,
    fade_padding: f64,
    geometry: Geometry,
}

impl TimelineAssembler {
    pub fn new(compositor: OverlayCompositor, fade_padding: f64, geometry: Geometry) -> Self {
        Self {
            compositor,
            fade_padding,
            geometry,
        }
    }

    /// Build the full program from segments in their final order
    pub fn assemble<E: MediaEngine + ?Sized>(
        &self,
        engine: &E,
        transition: &SourceClip,
        segments: &[Segment],
    ) -> Result<Timeline> {
        let mut elements = Vec::with_capacity(segments.len() * 2);

        for (i, segment) in segments.iter().enumerate() {
            let position = i + 1;
            debug!("Compositing {} -- {}", position, display_name(&segment.identifier));

            let transition_base = self.compositor.transition_base(engine, transition, self.geometry)?;
            let numbered_transition = self
                .compositor
                .compose(transition_base, [self.compositor.index_overlay(position)]);

            let content = self
                .compositor
                .compose(
                    Visual::from(segment),
                    [
                        self.compositor.index_overlay(position),
                        self.compositor.name_overlay(&segment.identifier),
                    ],
                )
                .with_fade_out(self.fade_padding);

            elements.push(numbered_transition);
            elements.push(content);
        }

        let timeline = Timeline { elements };
        info!(
            "Assembled {} clips into {} elements, {:.3}s",
            segments.len(),
            timeline.len(),
            timeline.total_duration()
        );
        Ok(timeline)
    }

    /// Log when the program does not add up to whole slots
    pub fn check_runtime(&self, timeline: &Timeline, slot_seconds: f64) {
        let expected = timeline.content_count() as f64 * slot_seconds;
        let actual = timeline.total_duration();
        if (actual - expected).abs() > 1e-6 {
            warn!(
                "Program runs {:.3}s, expected {:.3}s; segment lengths do not match the transition",
                actual, expected
            );
        }
    }
}
