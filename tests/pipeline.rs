use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Local;
use tempfile::{tempdir, TempDir};

use power_hour::{
    clips::{Geometry, MediaInfo, StartOverrideMap},
    composition::{CompositionEngine, Job},
    config::{Config, OverrunPolicy},
    error::{ClipError, ConfigError, MediaError, PowerHourError, Result},
    media::{MediaEngine, RenderReport, RenderTarget},
    overlay::ClipKind,
    Timeline,
};

/// In-memory media engine: durations keyed by file name
struct FakeEngine {
    durations: HashMap<String, f64>,
    probes: AtomicUsize,
    rendered: Mutex<Option<(Timeline, RenderTarget)>>,
}

impl FakeEngine {
    fn new(durations: &[(&str, f64)]) -> Self {
        Self {
            durations: durations
                .iter()
                .map(|(name, duration)| (name.to_string(), *duration))
                .collect(),
            probes: AtomicUsize::new(0),
            rendered: Mutex::new(None),
        }
    }
}

impl MediaEngine for FakeEngine {
    fn supports_shared_reuse(&self) -> bool {
        false
    }

    fn probe(&self, path: &Path) -> Result<MediaInfo> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let duration = self.durations.get(&name).copied().ok_or_else(|| MediaError::ProbeFailed {
            path: path.display().to_string(),
            reason: "unknown fixture".to_string(),
        })?;
        Ok(MediaInfo {
            duration,
            geometry: Geometry::new(1920, 1080),
            has_audio: name != "transition.avi",
        })
    }

    async fn render(&self, timeline: &Timeline, target: &RenderTarget) -> Result<RenderReport> {
        *self.rendered.lock().unwrap() = Some((timeline.clone(), target.clone()));
        Ok(RenderReport {
            path: target.output.clone(),
            duration: timeline.total_duration(),
            frame_count: (timeline.total_duration() * target.fps as f64) as u64,
            file_size: 0,
            finished_at: Local::now(),
        })
    }
}

fn source_dir(names: &[&str]) -> TempDir {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source_video");
    std::fs::create_dir(&source).unwrap();
    for name in names {
        std::fs::write(source.join(name), b"").unwrap();
    }
    dir
}

fn job(dir: &TempDir, overrides: Option<PathBuf>) -> Job {
    Job {
        source_dir: dir.path().join("source_video"),
        overrides,
        transition: dir.path().join("transition.avi"),
        output: dir.path().join("out.avi"),
    }
}

fn example_engine() -> FakeEngine {
    FakeEngine::new(&[
        ("clip1.mp4", 300.0),
        ("clip2.mp4", 90.0),
        ("clip3.mp4", 54.0),
        ("transition.avi", 5.0),
    ])
}

fn holding_config() -> Config {
    let mut config = Config::default();
    config.timing.overrun = OverrunPolicy::Hold;
    config
}

#[test]
fn test_three_clip_program() {
    let dir = source_dir(&["clip3.mp4", "clip1.mp4", "clip2.mp4"]);
    let engine = CompositionEngine::new(holding_config(), example_engine());

    let timeline = engine.plan(&job(&dir, None)).unwrap();

    assert_eq!(timeline.len(), 6);
    let elements = timeline.elements();
    let starts: Vec<f64> = elements
        .iter()
        .filter(|e| e.kind() == ClipKind::Content)
        .map(|e| e.base().start)
        .collect();
    assert_eq!(starts, vec![100.0, 30.0, 18.0]);

    for element in elements.iter().filter(|e| e.kind() == ClipKind::Content) {
        assert_eq!(element.duration(), 55.0);
    }
    assert_eq!(elements[0].kind(), ClipKind::Transition);
    assert_eq!(elements[0].duration(), 5.0);
    assert_eq!(timeline.total_duration(), 180.0);
}

#[test]
fn test_short_clip_fails_by_default() {
    let dir = source_dir(&["clip1.mp4", "clip2.mp4", "clip3.mp4"]);
    let engine = CompositionEngine::new(Config::default(), example_engine());

    let result = engine.plan(&job(&dir, None));
    match result {
        Err(PowerHourError::Clip(ClipError::SegmentTooLong { identifier, .. })) => {
            assert_eq!(identifier, "clip3.mp4");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_override_file() {
    let dir = source_dir(&["clip1.mp4", "clip2.mp4"]);
    let config_path = dir.path().join("power_hour.cfg");
    std::fs::write(&config_path, "# comment|5\nclip2.mp4|42\n").unwrap();

    let engine = CompositionEngine::new(
        Config::default(),
        FakeEngine::new(&[("clip1.mp4", 300.0), ("clip2.mp4", 120.0), ("transition.avi", 5.0)]),
    );
    let timeline = engine.plan(&job(&dir, Some(config_path))).unwrap();

    let content = &timeline.elements()[3];
    assert_eq!(content.base().identifier, "clip2.mp4");
    assert_eq!(content.base().start, 42.0);
    assert_eq!(content.duration(), 55.0);
}

#[test]
fn test_malformed_override_aborts_before_probing() {
    let dir = source_dir(&["clip1.mp4"]);
    let config_path = dir.path().join("power_hour.cfg");
    std::fs::write(&config_path, "clip1.mp4 42\n").unwrap();

    let engine = CompositionEngine::new(Config::default(), example_engine());
    let result = engine.plan(&job(&dir, Some(config_path)));

    assert!(matches!(
        result,
        Err(PowerHourError::Config(ConfigError::Format { line_number: 1, .. }))
    ));
    assert_eq!(engine.engine().probes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_delimiter_in_name_fails_before_probing() {
    let dir = source_dir(&["clip1.mp4", "a|b.mp4"]);
    let engine = CompositionEngine::new(Config::default(), example_engine());

    let overrides: StartOverrideMap = [("a|b.mp4".to_string(), 3.0)].into_iter().collect();
    let clips = vec![
        dir.path().join("source_video/a|b.mp4"),
        dir.path().join("source_video/clip1.mp4"),
    ];
    let result = engine.plan_clips(&clips, &overrides, &dir.path().join("transition.avi"));

    assert!(matches!(
        result,
        Err(PowerHourError::Clip(ClipError::InvalidName { .. }))
    ));
    assert_eq!(engine.engine().probes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_injected_order_is_respected() {
    let dir = source_dir(&[]);
    let engine = CompositionEngine::new(holding_config(), example_engine());

    let clips = vec![
        dir.path().join("source_video/clip2.mp4"),
        dir.path().join("source_video/clip1.mp4"),
    ];
    let timeline = engine
        .plan_clips(&clips, &StartOverrideMap::new(), &dir.path().join("transition.avi"))
        .unwrap();

    assert_eq!(timeline.elements()[1].base().identifier, "clip2.mp4");
    assert_eq!(timeline.elements()[3].base().identifier, "clip1.mp4");
    assert_eq!(timeline.elements()[3].layers()[0].text, "2");
}

#[test]
fn test_transition_reprobed_per_clip() {
    let dir = source_dir(&["clip1.mp4", "clip2.mp4"]);
    let engine = CompositionEngine::new(Config::default(), example_engine());
    engine.plan(&job(&dir, None)).unwrap();

    // initial transition probe + 2 clips + 2 per-composite transition probes
    assert_eq!(engine.engine().probes.load(Ordering::SeqCst), 5);
}

#[test]
fn test_transition_longer_than_slot() {
    let dir = source_dir(&["clip1.mp4"]);
    let engine = CompositionEngine::new(
        Config::default(),
        FakeEngine::new(&[("clip1.mp4", 300.0), ("transition.avi", 61.0)]),
    );
    assert!(matches!(
        engine.plan(&job(&dir, None)),
        Err(PowerHourError::Clip(ClipError::TransitionTooLong { .. }))
    ));
}

#[test]
fn test_planning_is_repeatable() {
    let dir = source_dir(&["clip1.mp4", "clip2.mp4", "clip3.mp4"]);
    let engine = CompositionEngine::new(holding_config(), example_engine());

    let first = engine.plan(&job(&dir, None)).unwrap();
    let second = engine.plan(&job(&dir, None)).unwrap();
    assert_eq!(first.total_duration(), second.total_duration());
    assert_eq!(first.boundaries(), second.boundaries());
}

#[tokio::test]
async fn test_compose_renders_timeline() {
    let dir = source_dir(&["clip1.mp4", "clip2.mp4"]);
    let engine = CompositionEngine::new(Config::default(), example_engine());

    let report = engine.compose(&job(&dir, None)).await.unwrap();
    assert_eq!(report.duration, 120.0);
    assert_eq!(report.frame_count, 2880);

    let rendered = engine.engine().rendered.lock().unwrap();
    let (timeline, target) = rendered.as_ref().unwrap();
    assert_eq!(timeline.len(), 4);
    assert_eq!(target.fps, 24);
    assert_eq!(target.codec, "libx264");
    assert_eq!(target.output, dir.path().join("out.avi"));
}

#[tokio::test]
async fn test_empty_source_directory() {
    let dir = source_dir(&[]);
    let engine = CompositionEngine::new(Config::default(), example_engine());

    assert!(matches!(
        engine.compose(&job(&dir, None)).await,
        Err(PowerHourError::Composition(_))
    ));
}
