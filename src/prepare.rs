//! The preparation pipeline.
//!
//! [`prepare`] runs the full sequence against a real file: existence check,
//! open and inspect, sample the last frame, save it, write both templates,
//! release. [`prepare_with`] takes the opener as a parameter so any
//! [`FrameSource`] can stand in for FFmpeg.
//!
//! The existence check is the only step that runs before a decoder is
//! opened. Once a source is open it lives in a [`ReleaseGuard`], which
//! closes it exactly once whether the run finishes or stops on an error.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    configuration::PrepareOptions,
    conversion::last_frame_timestamp,
    error::{PrepareError, Stage},
    media::MediaFile,
    metadata::ClipMetadata,
    progress::{PREPARE_STAGE_COUNT, ProgressTracker},
    release::ReleaseGuard,
    source::FrameSource,
    templates,
};

/// The result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedArtifacts {
    /// Metadata of the input clip.
    pub metadata: ClipMetadata,
    /// Timestamp the last frame was sampled at.
    pub sampled_at: Duration,
    /// Width of the saved frame.
    pub frame_width: u32,
    /// Height of the saved frame.
    pub frame_height: u32,
    /// Where the frame was saved.
    pub frame_path: PathBuf,
    /// Where the clip analysis template was written.
    pub analysis_path: PathBuf,
    /// Where the generation prompt template was written.
    pub prompt_path: PathBuf,
}

/// Run the pipeline on the file named by `options`, decoding with FFmpeg.
///
/// # Errors
///
/// Returns [`PrepareError::InputNotFound`] without opening anything or
/// writing any file when the input does not exist. Any later failure is
/// returned with its [`Stage`]; the decoder is still released.
///
/// # Example
///
/// ```no_run
/// use lastframe::PrepareOptions;
///
/// let artifacts = lastframe::prepare(&PrepareOptions::new("input_clip.mp4"))?;
/// println!("sampled at {:?}", artifacts.sampled_at);
/// # Ok::<(), lastframe::PrepareError>(())
/// ```
pub fn prepare(options: &PrepareOptions) -> Result<PreparedArtifacts, PrepareError> {
    prepare_with(options, |path| MediaFile::open(path))
}

/// Run the pipeline with a caller-supplied opener.
///
/// `open` is only called after the existence check passes.
///
/// # Errors
///
/// Same as [`prepare`], plus whatever `open` returns.
pub fn prepare_with<S, F>(
    options: &PrepareOptions,
    open: F,
) -> Result<PreparedArtifacts, PrepareError>
where
    S: FrameSource,
    F: FnOnce(&Path) -> Result<S, PrepareError>,
{
    let mut tracker = ProgressTracker::new(options.progress.as_ref(), PREPARE_STAGE_COUNT);

    check_exists(&options.input)?;

    tracker.begin(Stage::Inspect);
    let mut source = ReleaseGuard::new(open(&options.input)?);
    let metadata = source.metadata().clone();
    log::info!("Loaded video: {}", options.input.display());
    log::info!("{metadata}");

    tracker.begin(Stage::Sample);
    let sampled_at = last_frame_timestamp(metadata.duration, options.epsilon);
    log::debug!("Sampling last frame at {:.3}s", sampled_at.as_secs_f64());
    let frame = source.frame_at(sampled_at, options.pixel_format)?;

    tracker.begin(Stage::SaveImage);
    frame
        .save(&options.frame_path)
        .map_err(|error| PrepareError::ImageSave {
            path: options.frame_path.clone(),
            source: error,
        })?;
    log::info!("Saved last frame to {}", options.frame_path.display());
    let (frame_width, frame_height) = (frame.width(), frame.height());
    drop(frame);

    tracker.begin(Stage::WriteAnalysis);
    templates::write_clip_analysis(&options.analysis_path)?;

    tracker.begin(Stage::WritePrompt);
    templates::write_ai_prompt(&options.prompt_path, &options.input)?;

    tracker.begin(Stage::Release);
    source.release();

    Ok(PreparedArtifacts {
        metadata,
        sampled_at,
        frame_width,
        frame_height,
        frame_path: options.frame_path.clone(),
        analysis_path: options.analysis_path.clone(),
        prompt_path: options.prompt_path.clone(),
    })
}

/// Open `path`, read its metadata, and release it.
///
/// # Errors
///
/// Returns [`PrepareError::InputNotFound`] for a missing path, or the open
/// error.
pub fn inspect<P: AsRef<Path>>(path: P) -> Result<ClipMetadata, PrepareError> {
    inspect_with(path.as_ref(), |path| MediaFile::open(path))
}

/// [`inspect`] with a caller-supplied opener.
///
/// # Errors
///
/// Same as [`inspect`].
pub fn inspect_with<S, F>(path: &Path, open: F) -> Result<ClipMetadata, PrepareError>
where
    S: FrameSource,
    F: FnOnce(&Path) -> Result<S, PrepareError>,
{
    check_exists(path)?;
    let source = ReleaseGuard::new(open(path)?);
    let metadata = source.metadata().clone();
    source.release();
    Ok(metadata)
}

fn check_exists(path: &Path) -> Result<(), PrepareError> {
    if path.exists() {
        Ok(())
    } else {
        log::debug!("Input video not found at {}", path.display());
        Err(PrepareError::InputNotFound {
            path: path.to_path_buf(),
        })
    }
}
