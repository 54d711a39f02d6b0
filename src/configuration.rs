//! Run configuration.
//!
//! [`PrepareOptions`] is a builder carrying the input path, the three output
//! paths, and the sampling settings into [`prepare`](crate::prepare). Nothing
//! is read from globals, so tests can point a run at any directory.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use lastframe::{PixelFormat, PrepareOptions};
//!
//! let options = PrepareOptions::new("takes/shot_04.mp4")
//!     .with_frame_path("out/last_frame.png")
//!     .with_epsilon(Duration::from_millis(40))
//!     .with_pixel_format(PixelFormat::Rgba8);
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use ffmpeg_next::format::Pixel;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::progress::{NoOpProgress, ProgressCallback};

/// Default input video path.
pub const DEFAULT_INPUT: &str = "input_clip.mp4";
/// Default path of the extracted last frame.
pub const DEFAULT_FRAME_PATH: &str = "last_frame.png";
/// Default path of the clip analysis template.
pub const DEFAULT_ANALYSIS_PATH: &str = "clip_analysis.txt";
/// Default path of the generation prompt template.
pub const DEFAULT_PROMPT_PATH: &str = "ai_prompt.txt";
/// Default safety margin subtracted from the duration before sampling.
pub const DEFAULT_EPSILON: Duration = Duration::from_millis(50);
/// Smallest accepted safety margin. A zero margin would sample at the end.
pub const MIN_EPSILON: Duration = Duration::from_millis(1);

/// Pixel layout of the saved still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB. This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA with opaque alpha.
    Rgba8,
    /// 8-bit grayscale.
    Gray8,
}

impl PixelFormat {
    /// Map to the FFmpeg scaler output format.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Rgba8 => Pixel::RGBA,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }

    /// Wrap a tightly-packed buffer in the matching [`DynamicImage`] variant.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub(crate) fn wrap_buffer(
        self,
        width: u32,
        height: u32,
        buffer: Vec<u8>,
    ) -> Option<DynamicImage> {
        match self {
            PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::from),
            PixelFormat::Rgba8 => {
                RgbaImage::from_raw(width, height, buffer).map(DynamicImage::from)
            }
            PixelFormat::Gray8 => {
                GrayImage::from_raw(width, height, buffer).map(DynamicImage::from)
            }
        }
    }

    /// Parse a user-supplied name (`rgb8`, `rgba`, `gray`, ...).
    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
            "rgba8" | "rgba" => Some(PixelFormat::Rgba8),
            "gray8" | "gray" | "grey" | "grayscale" => Some(PixelFormat::Gray8),
            _ => None,
        }
    }
}

/// Configuration for one preparation run.
///
/// Defaults reproduce the classic layout: read `input_clip.mp4`, write
/// `last_frame.png`, `clip_analysis.txt` and `ai_prompt.txt` into the
/// working directory, sampling 50 ms before the end.
#[derive(Clone)]
pub struct PrepareOptions {
    pub(crate) input: PathBuf,
    pub(crate) frame_path: PathBuf,
    pub(crate) analysis_path: PathBuf,
    pub(crate) prompt_path: PathBuf,
    pub(crate) epsilon: Duration,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for PrepareOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PrepareOptions")
            .field("input", &self.input)
            .field("frame_path", &self.frame_path)
            .field("analysis_path", &self.analysis_path)
            .field("prompt_path", &self.prompt_path)
            .field("epsilon", &self.epsilon)
            .field("pixel_format", &self.pixel_format)
            .finish_non_exhaustive()
    }
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT)
    }
}

impl PrepareOptions {
    /// Options for `input` with default output paths and sampling.
    pub fn new<P: Into<PathBuf>>(input: P) -> Self {
        Self {
            input: input.into(),
            frame_path: PathBuf::from(DEFAULT_FRAME_PATH),
            analysis_path: PathBuf::from(DEFAULT_ANALYSIS_PATH),
            prompt_path: PathBuf::from(DEFAULT_PROMPT_PATH),
            epsilon: DEFAULT_EPSILON,
            pixel_format: PixelFormat::default(),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Place all three outputs, with their default file names, in `directory`.
    #[must_use]
    pub fn with_output_dir<P: AsRef<Path>>(mut self, directory: P) -> Self {
        let directory = directory.as_ref();
        self.frame_path = directory.join(DEFAULT_FRAME_PATH);
        self.analysis_path = directory.join(DEFAULT_ANALYSIS_PATH);
        self.prompt_path = directory.join(DEFAULT_PROMPT_PATH);
        self
    }

    /// Set the extracted frame path. The image format follows the extension.
    #[must_use]
    pub fn with_frame_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.frame_path = path.into();
        self
    }

    /// Set the clip analysis template path.
    #[must_use]
    pub fn with_analysis_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.analysis_path = path.into();
        self
    }

    /// Set the generation prompt template path.
    #[must_use]
    pub fn with_prompt_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.prompt_path = path.into();
        self
    }

    /// Set the safety margin subtracted from the duration before sampling.
    ///
    /// Clamped to a minimum of [`MIN_EPSILON`].
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: Duration) -> Self {
        self.epsilon = epsilon.max(MIN_EPSILON);
        self
    }

    /// Set the pixel layout of the saved still.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Attach a stage progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The input video path.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// The extracted frame path.
    pub fn frame_path(&self) -> &Path {
        &self.frame_path
    }

    /// The clip analysis template path.
    pub fn analysis_path(&self) -> &Path {
        &self.analysis_path
    }

    /// The generation prompt template path.
    pub fn prompt_path(&self) -> &Path {
        &self.prompt_path
    }

    /// The sampling safety margin.
    pub fn epsilon(&self) -> Duration {
        self.epsilon
    }

    /// The pixel layout of the saved still.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }
}
