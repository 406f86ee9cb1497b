use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    clips::{
        check_identifier, discover_clips, identifier_for, ClipSelector, Segment, SegmentPlan,
        SourceClip, StartOverrideMap,
    },
    config::Config,
    error::Result,
    media::{MediaEngine, RenderReport, RenderTarget},
    overlay::OverlayCompositor,
    timeline::{Timeline, TimelineAssembler},
};

/// Inputs and output of one run
#[derive(Debug, Clone)]
pub struct Job {
    /// Directory containing the source clips
    pub source_dir: PathBuf,

    /// Optional start override file
    pub overrides: Option<PathBuf>,

    /// Transition clip played before every source clip
    pub transition: PathBuf,

    /// Rendered output file
    pub output: PathBuf,
}

/// Main composition engine that builds a power hour
///
/// The engine follows a clear pipeline:
/// 1. Start overrides - parse the optional override file
/// 2. Clip discovery - list and validate source clips
/// 3. Transition - probe the transition and derive the segment length
/// 4. Clip selection - cut every source clip to one segment
/// 5. Timeline assembly - interleave numbered transitions and overlays
/// 6. Rendering - hand the timeline to the media engine
pub struct CompositionEngine<E: MediaEngine> {
    config: Config,
    engine: E,
}

impl<E: MediaEngine> CompositionEngine<E> {
    /// Create a new composition engine with the given configuration and media engine
    pub fn new(config: Config, engine: E) -> Self {
        Self { config, engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Build the timeline and render it
    pub async fn compose(&self, job: &Job) -> Result<RenderReport> {
        info!("Starting power hour composition");
        info!("   Source: {:?}", job.source_dir);
        info!("   Transition: {:?}", job.transition);
        info!("   Output: {:?}", job.output);

        let timeline = self.plan(job)?;

        // Pipeline Step 6: Rendering
        info!("Step 6: Rendering...");
        let target = RenderTarget::from_config(&job.output, &self.config);
        let report = self.engine.render(&timeline, &target).await?;

        info!("   Rendered {:.1}s, {} frames", report.duration, report.frame_count);
        info!("   File size: {:.1} MB", report.file_size as f64 / 1024.0 / 1024.0);
        Ok(report)
    }

    /// Steps 1-5: everything up to, but not including, rendering
    pub fn plan(&self, job: &Job) -> Result<Timeline> {
        let overrides = self.load_overrides(job.overrides.as_deref())?;

        info!("Step 2: Discovering clips...");
        let clips = discover_clips(&job.source_dir)?;
        info!("   {} clips in {:?}", clips.len(), job.source_dir);

        self.plan_clips(&clips, &overrides, &job.transition)
    }

    /// Build the timeline from an explicit, already ordered clip list
    pub fn plan_clips(
        &self,
        clip_paths: &[PathBuf],
        overrides: &StartOverrideMap,
        transition_path: &Path,
    ) -> Result<Timeline> {
        let delimiter = self.config.overrides.delimiter;
        let identifiers: Vec<String> = clip_paths.iter().map(|p| identifier_for(p)).collect();

        // names are checked before anything is probed
        for identifier in &identifiers {
            check_identifier(identifier, delimiter)?;
        }
        for name in overrides.identifiers() {
            if !identifiers.iter().any(|identifier| identifier == name) {
                warn!("Start override for {} matches no source clip", name);
            }
        }

        let (transition, plan) = self.load_transition(transition_path)?;

        let geometry = self.engine.output_geometry(self.config.output.geometry());
        let selector = ClipSelector::new(
            delimiter,
            plan,
            self.config.output.geometry(),
            self.config.timing.overrun,
        );
        let segments = self.select_segments(&selector, clip_paths, overrides)?;

        info!("Step 5: Assembling timeline...");
        let compositor = OverlayCompositor::new(
            self.config.overlay.clone(),
            self.config.timing.name_reveal_delay,
        );
        let assembler = TimelineAssembler::new(compositor, self.config.timing.fade_padding, geometry);
        let timeline = assembler.assemble(&self.engine, &transition, &segments)?;
        assembler.check_runtime(&timeline, plan.slot_seconds());

        Ok(timeline)
    }

    /// Pipeline Step 1: parse the start override file, if any
    fn load_overrides(&self, path: Option<&Path>) -> Result<StartOverrideMap> {
        info!("Step 1: Loading start overrides...");
        match path {
            Some(path) => {
                let overrides = StartOverrideMap::from_file(path, self.config.overrides.delimiter)?;
                info!("   {} overrides from {:?}", overrides.len(), path);
                Ok(overrides)
            }
            None => {
                info!("   No override file, every clip starts a third of the way in");
                Ok(StartOverrideMap::new())
            }
        }
    }

    /// Pipeline Step 3: probe the transition and fix the segment length
    fn load_transition(&self, path: &Path) -> Result<(SourceClip, SegmentPlan)> {
        info!("Step 3: Probing transition...");
        let info = self.engine.probe(path)?;
        let transition = SourceClip::new(path, info);

        let timing = &self.config.timing;
        if transition.duration() > timing.transition_warn_threshold {
            warn!(
                "Your transition is longer than {} seconds ({:.2}s). For best results, trim the clip to 5-6 seconds.",
                timing.transition_warn_threshold,
                transition.duration()
            );
        }

        let plan = SegmentPlan::new(timing.slot_seconds, transition.duration())?;
        if !plan.reveals_after(timing.name_reveal_delay) {
            warn!(
                "Segments are {:.2}s long, clip names revealed after {}s will never be shown",
                plan.segment_length(),
                timing.name_reveal_delay
            );
        }
        info!(
            "   Transition {:.2}s, segments {:.2}s",
            plan.transition_duration(),
            plan.segment_length()
        );
        Ok((transition, plan))
    }

    /// Pipeline Step 4: probe and cut every clip, in order
    fn select_segments(
        &self,
        selector: &ClipSelector,
        clip_paths: &[PathBuf],
        overrides: &StartOverrideMap,
    ) -> Result<Vec<Segment>> {
        info!("Step 4: Selecting segments...");
        let mut segments = Vec::with_capacity(clip_paths.len());

        for (i, path) in clip_paths.iter().enumerate() {
            info!("Processing: {} -- {}", i, identifier_for(path));
            let info = self.engine.probe(path)?;
            let clip = SourceClip::new(path.as_path(), info);

            let segment = selector.select(&clip, overrides, &self.engine)?;
            debug!(
                "   {} start {:.3}s{}",
                clip.identifier,
                segment.start,
                if overrides.contains(&clip.identifier) { " (override)" } else { "" }
            );
            segments.push(segment);
        }

        Ok(segments)
    }
}
