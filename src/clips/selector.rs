use tracing::{debug, warn};

use crate::clips::overrides::StartOverrideMap;
use crate::clips::types::{Geometry, Segment, SourceClip};
use crate::config::OverrunPolicy;
use crate::error::{ClipError, ResizeMismatch, Result};
use crate::media::MediaEngine;

/// Slot arithmetic shared by every clip in a run.
///
/// One slot is a transition followed by a content segment, so the segment
/// length is whatever the transition leaves of the slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlan {
    slot_seconds: f64,
    transition_duration: f64,
}

impl SegmentPlan {
    pub fn new(slot_seconds: f64, transition_duration: f64) -> Result<Self> {
        if transition_duration >= slot_seconds {
            return Err(ClipError::TransitionTooLong {
                duration: transition_duration,
                slot: slot_seconds,
            }
            .into());
        }
        Ok(Self {
            slot_seconds,
            transition_duration,
        })
    }

    pub fn slot_seconds(&self) -> f64 {
        self.slot_seconds
    }

    pub fn transition_duration(&self) -> f64 {
        self.transition_duration
    }

    pub fn segment_length(&self) -> f64 {
        self.slot_seconds - self.transition_duration
    }

    /// Whether an overlay delayed by `delay` seconds shows up before the segment ends
    pub fn reveals_after(&self, delay: f64) -> bool {
        delay < self.segment_length()
    }
}

/// Reject a clip identifier containing the override delimiter
pub fn check_identifier(identifier: &str, delimiter: char) -> Result<()> {
    if identifier.contains(delimiter) {
        return Err(ClipError::InvalidName {
            identifier: identifier.to_string(),
            delimiter,
        }
        .into());
    }
    Ok(())
}

/// Decides where each source clip is cut
#[derive(Debug, Clone)]
pub struct ClipSelector {
    delimiter: char,
    plan: SegmentPlan,
    geometry: Geometry,
    overrun: OverrunPolicy,
}

impl ClipSelector {
    pub fn new(delimiter: char, plan: SegmentPlan, geometry: Geometry, overrun: OverrunPolicy) -> Self {
        Self {
            delimiter,
            plan,
            geometry,
            overrun,
        }
    }

    /// Reject identifiers that would be ambiguous in the override file.
    ///
    /// Applies to every clip, whether or not it has an override.
    pub fn validate_identifier(&self, identifier: &str) -> Result<()> {
        check_identifier(identifier, self.delimiter)
    }

    /// Start offset: the configured override, otherwise a third of the way in
    pub fn start_for(&self, clip: &SourceClip, overrides: &StartOverrideMap) -> f64 {
        overrides
            .get(&clip.identifier)
            .unwrap_or_else(|| clip.duration() / 3.0)
    }

    /// Cut and resize one source clip
    pub fn select<E: MediaEngine + ?Sized>(
        &self,
        clip: &SourceClip,
        overrides: &StartOverrideMap,
        engine: &E,
    ) -> Result<Segment> {
        self.validate_identifier(&clip.identifier)?;

        let start = self.start_for(clip, overrides);
        let end = start + self.plan.segment_length();
        let duration = clip.duration();

        let hold = if end <= duration {
            0.0
        } else {
            match self.overrun {
                OverrunPolicy::Hold if start < duration => {
                    warn!(
                        "{} ends at {:.2}s, holding the last frame for {:.2}s",
                        clip.identifier,
                        duration,
                        end - duration
                    );
                    end - duration
                }
                _ => {
                    return Err(ClipError::SegmentTooLong {
                        identifier: clip.identifier.clone(),
                        start,
                        end,
                        duration,
                    }
                    .into())
                }
            }
        };

        let actual = engine.output_geometry(self.geometry);
        if actual != self.geometry {
            let mismatch = ResizeMismatch {
                requested: self.geometry.as_tuple(),
                actual: actual.as_tuple(),
            };
            warn!("{}: {}", clip.identifier, mismatch);
        }

        debug!(
            "{}: segment {:.3}s-{:.3}s of {:.3}s at {}",
            clip.identifier, start, end, duration, actual
        );

        Ok(Segment {
            path: clip.path.clone(),
            identifier: clip.identifier.clone(),
            start,
            end,
            geometry: actual,
            has_audio: clip.info.has_audio,
            hold,
        })
    }
}
