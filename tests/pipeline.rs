//! Pipeline integration tests.
//!
//! These run the full pipeline against an in-memory `FrameSource` so the
//! ordering, overwrite, and release guarantees can be checked without
//! FFmpeg fixtures, including under injected decode and close failures.

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    sync::{Arc, Mutex},
    time::Duration,
};

use image::DynamicImage;
use lastframe::{
    ClipMetadata, FrameSource, PixelFormat, PrepareError, PrepareOptions, ProgressCallback,
    ProgressInfo, Stage, templates,
};

#[derive(Debug, Default)]
struct Calls {
    opened: u32,
    sampled_at: Vec<Duration>,
    audio_closes: u32,
    reader_closes: u32,
}

#[derive(Clone, Copy, Default)]
struct Faults {
    fail_sample: bool,
    fail_audio_close: bool,
    fail_reader_close: bool,
}

struct FakeClip {
    metadata: ClipMetadata,
    calls: Rc<RefCell<Calls>>,
    faults: Faults,
    audio_open: bool,
}

impl FrameSource for FakeClip {
    fn metadata(&self) -> &ClipMetadata {
        &self.metadata
    }

    fn frame_at(
        &mut self,
        timestamp: Duration,
        pixel_format: PixelFormat,
    ) -> Result<DynamicImage, PrepareError> {
        self.calls.borrow_mut().sampled_at.push(timestamp);
        if self.faults.fail_sample {
            return Err(PrepareError::FrameDecode("injected decode failure".into()));
        }
        let (width, height) = (self.metadata.width, self.metadata.height);
        Ok(match pixel_format {
            PixelFormat::Rgb8 => DynamicImage::new_rgb8(width, height),
            PixelFormat::Rgba8 => DynamicImage::new_rgba8(width, height),
            PixelFormat::Gray8 => DynamicImage::new_luma8(width, height),
        })
    }

    fn has_audio(&self) -> bool {
        self.audio_open
    }

    fn close_audio(&mut self) -> Result<(), PrepareError> {
        self.calls.borrow_mut().audio_closes += 1;
        self.audio_open = false;
        if self.faults.fail_audio_close {
            return Err(PrepareError::Release("injected audio close failure".into()));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), PrepareError> {
        self.calls.borrow_mut().reader_closes += 1;
        if self.faults.fail_reader_close {
            return Err(PrepareError::Release("injected reader close failure".into()));
        }
        Ok(())
    }
}

fn clip_metadata(duration: Duration, width: u32, height: u32) -> ClipMetadata {
    ClipMetadata {
        duration,
        frames_per_second: Some(24.0),
        width,
        height,
        codec: "h264".to_string(),
        format: "mp4".to_string(),
        audio: None,
    }
}

struct Harness {
    directory: tempfile::TempDir,
    input: PathBuf,
    calls: Rc<RefCell<Calls>>,
}

impl Harness {
    fn new() -> Self {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let input = directory.path().join("input_clip.mp4");
        fs::write(&input, b"placeholder").expect("Failed to write input");
        Self {
            directory,
            input,
            calls: Rc::new(RefCell::new(Calls::default())),
        }
    }

    fn options(&self) -> PrepareOptions {
        PrepareOptions::new(&self.input).with_output_dir(self.directory.path())
    }

    fn run(
        &self,
        options: &PrepareOptions,
        metadata: ClipMetadata,
        faults: Faults,
        audio_open: bool,
    ) -> Result<lastframe::PreparedArtifacts, PrepareError> {
        let calls = self.calls.clone();
        lastframe::prepare_with(options, |_path: &Path| {
            calls.borrow_mut().opened += 1;
            Ok(FakeClip {
                metadata,
                calls,
                faults,
                audio_open,
            })
        })
    }

    fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.directory.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .filter(|name| name != "input_clip.mp4")
            .collect();
        names.sort();
        names
    }
}

#[test]
fn five_second_clip_samples_at_4_95() {
    let harness = Harness::new();
    let options = harness.options();
    let artifacts = harness
        .run(
            &options,
            clip_metadata(Duration::from_secs(5), 1920, 1080),
            Faults::default(),
            true,
        )
        .expect("prepare");

    assert_eq!(artifacts.sampled_at, Duration::from_millis(4950));
    assert_eq!(harness.calls.borrow().sampled_at, vec![Duration::from_millis(4950)]);

    let image = image::open(options.frame_path()).expect("open saved frame");
    assert_eq!((image.width(), image.height()), (1920, 1080));
    assert_eq!((artifacts.frame_width, artifacts.frame_height), (1920, 1080));

    let analysis = fs::read_to_string(options.analysis_path()).expect("analysis");
    assert_eq!(
        analysis.lines().next(),
        Some("Clip Analysis (fill these 2-3 sentences):")
    );
    let prompt = fs::read_to_string(options.prompt_path()).expect("prompt");
    assert!(prompt.contains("8-12 second photorealistic continuation"));
}

#[test]
fn clip_shorter_than_epsilon_samples_at_zero() {
    let harness = Harness::new();
    let artifacts = harness
        .run(
            &harness.options(),
            clip_metadata(Duration::from_millis(30), 64, 36),
            Faults::default(),
            false,
        )
        .expect("prepare");
    assert_eq!(artifacts.sampled_at, Duration::ZERO);
}

#[test]
fn missing_input_opens_nothing_and_writes_nothing() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = directory.path().join("no_such_file.mp4");
    let options = PrepareOptions::new(&input).with_output_dir(directory.path());
    let mut opened = false;

    let result = lastframe::prepare_with(&options, |_path: &Path| {
        opened = true;
        Err::<FakeClip, _>(PrepareError::NoVideoStream)
    });

    let error = result.expect_err("missing input must fail");
    assert!(error.is_input_not_found());
    assert!(error.to_string().contains("no_such_file.mp4"));
    assert!(!opened);
    assert_eq!(fs::read_dir(directory.path()).expect("read_dir").count(), 0);
}

#[test]
fn exactly_three_outputs_and_reruns_overwrite() {
    let harness = Harness::new();
    let options = harness.options();
    fs::write(options.prompt_path(), "stale content that is much longer than nothing")
        .expect("seed stale prompt");

    for _ in 0..2 {
        harness
            .run(
                &options,
                clip_metadata(Duration::from_secs(2), 32, 18),
                Faults::default(),
                false,
            )
            .expect("prepare");
    }

    assert_eq!(
        harness.output_files(),
        vec!["ai_prompt.txt", "clip_analysis.txt", "last_frame.png"]
    );
    let prompt = fs::read_to_string(options.prompt_path()).expect("prompt");
    assert!(!prompt.contains("stale content"));
}

#[test]
fn templates_are_identical_across_runs() {
    let harness = Harness::new();
    let options = harness.options();
    let metadata = clip_metadata(Duration::from_secs(1), 8, 8);

    harness
        .run(&options, metadata.clone(), Faults::default(), false)
        .expect("first run");
    let first_analysis = fs::read(options.analysis_path()).expect("analysis");
    let first_prompt = fs::read(options.prompt_path()).expect("prompt");

    harness
        .run(&options, metadata, Faults::default(), false)
        .expect("second run");
    assert_eq!(fs::read(options.analysis_path()).expect("analysis"), first_analysis);
    assert_eq!(fs::read(options.prompt_path()).expect("prompt"), first_prompt);

    assert_eq!(first_analysis, templates::CLIP_ANALYSIS_TEMPLATE.as_bytes());
    let prompt = String::from_utf8(first_prompt).expect("utf-8");
    let source_line = format!("Source clip: {}", harness.input.display());
    assert!(prompt.lines().any(|line| line == source_line), "{prompt}");
}

#[test]
fn release_runs_once_when_sampling_fails() {
    let harness = Harness::new();
    let faults = Faults {
        fail_sample: true,
        ..Faults::default()
    };
    let error = harness
        .run(
            &harness.options(),
            clip_metadata(Duration::from_secs(3), 16, 16),
            faults,
            true,
        )
        .expect_err("sampling failure must surface");

    assert_eq!(error.stage(), Stage::Sample);
    let calls = harness.calls.borrow();
    assert_eq!(calls.opened, 1);
    assert_eq!(calls.audio_closes, 1);
    assert_eq!(calls.reader_closes, 1);
    drop(calls);
    assert!(harness.output_files().is_empty());
}

#[test]
fn release_runs_once_on_success() {
    let harness = Harness::new();
    harness
        .run(
            &harness.options(),
            clip_metadata(Duration::from_secs(3), 16, 16),
            Faults::default(),
            true,
        )
        .expect("prepare");

    let calls = harness.calls.borrow();
    assert_eq!(calls.audio_closes, 1);
    assert_eq!(calls.reader_closes, 1);
}

#[test]
fn close_failures_do_not_change_the_outcome() {
    let harness = Harness::new();
    let faults = Faults {
        fail_audio_close: true,
        fail_reader_close: true,
        ..Faults::default()
    };
    let artifacts = harness
        .run(
            &harness.options(),
            clip_metadata(Duration::from_secs(3), 16, 16),
            faults,
            true,
        )
        .expect("close failures must be swallowed");
    assert_eq!(artifacts.sampled_at, Duration::from_millis(2950));

    let calls = harness.calls.borrow();
    assert_eq!(calls.audio_closes, 1);
    assert_eq!(calls.reader_closes, 1);
}

#[test]
fn close_failure_does_not_mask_sampling_error() {
    let harness = Harness::new();
    let faults = Faults {
        fail_sample: true,
        fail_reader_close: true,
        ..Faults::default()
    };
    let error = harness
        .run(
            &harness.options(),
            clip_metadata(Duration::from_secs(3), 16, 16),
            faults,
            false,
        )
        .expect_err("sampling failure must surface");
    assert!(matches!(error, PrepareError::FrameDecode(_)));
}

#[test]
fn template_write_failure_names_stage_and_still_releases() {
    let harness = Harness::new();
    let options = harness
        .options()
        .with_analysis_path(harness.directory.path().join("missing/clip_analysis.txt"));
    let error = harness
        .run(
            &options,
            clip_metadata(Duration::from_secs(1), 4, 4),
            Faults::default(),
            false,
        )
        .expect_err("unwritable analysis path");
    assert_eq!(error.stage(), Stage::WriteAnalysis);
    assert_eq!(harness.calls.borrow().reader_closes, 1);
}

#[test]
fn pixel_format_reaches_the_decoder() {
    let harness = Harness::new();
    let options = harness.options().with_pixel_format(PixelFormat::Rgba8);
    harness
        .run(
            &options,
            clip_metadata(Duration::from_secs(1), 4, 4),
            Faults::default(),
            false,
        )
        .expect("prepare");
    let image = image::open(options.frame_path()).expect("open saved frame");
    assert!(matches!(image, DynamicImage::ImageRgba8(_)));
}

#[derive(Default)]
struct StageRecorder(Mutex<Vec<Stage>>);

impl ProgressCallback for StageRecorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.0.lock().expect("lock").push(info.stage);
    }
}

#[test]
fn stages_are_reported_in_order() {
    let harness = Harness::new();
    let recorder = Arc::new(StageRecorder::default());
    let options = harness.options().with_progress(recorder.clone());
    harness
        .run(
            &options,
            clip_metadata(Duration::from_secs(1), 4, 4),
            Faults::default(),
            false,
        )
        .expect("prepare");

    assert_eq!(
        *recorder.0.lock().expect("lock"),
        vec![
            Stage::Inspect,
            Stage::Sample,
            Stage::SaveImage,
            Stage::WriteAnalysis,
            Stage::WritePrompt,
            Stage::Release,
        ]
    );
}

#[test]
fn inspect_releases_without_writing() {
    let harness = Harness::new();
    let calls = harness.calls.clone();
    let metadata = lastframe::inspect_with(&harness.input, |_path: &Path| {
        Ok(FakeClip {
            metadata: clip_metadata(Duration::from_secs(5), 1920, 1080),
            calls,
            faults: Faults::default(),
            audio_open: true,
        })
    })
    .expect("inspect");

    assert_eq!((metadata.width, metadata.height), (1920, 1080));
    assert_eq!(harness.calls.borrow().reader_closes, 1);
    assert_eq!(harness.calls.borrow().audio_closes, 1);
    assert!(harness.output_files().is_empty());
}
