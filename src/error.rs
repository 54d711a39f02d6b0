//! Error types for the `lastframe` crate.
//!
//! This module defines [`PrepareError`], the unified error type returned by
//! every fallible operation in the crate, and [`Stage`], which names the
//! pipeline step an error came from. Errors carry the offending path or the
//! upstream message so callers can report them without extra logging.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::Error as IoError,
    path::PathBuf,
    time::Duration,
};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// A step of the preparation pipeline.
///
/// Steps run strictly in declaration order. [`Stage::Existence`] is the only
/// step that runs before a decoder is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Checking that the input path exists.
    Existence,
    /// Opening the container and locating the video stream.
    Open,
    /// Reading duration, frame rate, and dimensions.
    Inspect,
    /// Decoding the frame at the last-frame timestamp.
    Sample,
    /// Encoding the sampled frame to the image path.
    SaveImage,
    /// Writing the clip analysis template.
    WriteAnalysis,
    /// Writing the generation prompt template.
    WritePrompt,
    /// Releasing the decoding handle.
    Release,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Stage::Existence => "existence check",
            Stage::Open => "open",
            Stage::Inspect => "inspect",
            Stage::Sample => "sample last frame",
            Stage::SaveImage => "save image",
            Stage::WriteAnalysis => "write analysis template",
            Stage::WritePrompt => "write prompt template",
            Stage::Release => "release",
        };
        f.write_str(name)
    }
}

/// The unified error type for all `lastframe` operations.
///
/// Every public function that can fail returns `Result<T, PrepareError>`.
/// Use [`stage`](PrepareError::stage) to find out which pipeline step
/// failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PrepareError {
    /// The configured input video does not exist.
    #[error("Input video not found at {}", path.display())]
    InputNotFound {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The media file could not be opened.
    #[error("Failed to open media file at {}: {reason}", path.display())]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The frame at the requested timestamp could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    FrameDecode(String),

    /// The requested timestamp lies outside `[0, duration)`.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(Duration),

    /// The sampled frame could not be encoded to the image path.
    #[error("Failed to save frame to {}: {source}", path.display())]
    ImageSave {
        /// Destination image path.
        path: PathBuf,
        /// Error from the `image` crate.
        source: ImageError,
    },

    /// A template file could not be written.
    #[error("Failed to {stage} at {}: {source}", path.display())]
    TemplateWrite {
        /// Destination template path.
        path: PathBuf,
        /// Which template was being written.
        stage: Stage,
        /// Underlying I/O error.
        source: IoError,
    },

    /// Closing part of the decoding handle failed.
    ///
    /// Only produced by [`FrameSource`](crate::FrameSource) close methods.
    /// The pipeline logs and discards it.
    #[error("Failed to release decoder: {0}")]
    Release(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

impl PrepareError {
    /// The pipeline stage this error belongs to.
    ///
    /// Errors that can surface from more than one step (raw FFmpeg errors)
    /// report the step where they are most commonly raised.
    pub fn stage(&self) -> Stage {
        match self {
            PrepareError::InputNotFound { .. } => Stage::Existence,
            PrepareError::FileOpen { .. } | PrepareError::NoVideoStream => Stage::Open,
            PrepareError::FrameDecode(_)
            | PrepareError::InvalidTimestamp(_)
            | PrepareError::FfmpegError(_) => Stage::Sample,
            PrepareError::ImageSave { .. } => Stage::SaveImage,
            PrepareError::TemplateWrite { stage, .. } => *stage,
            PrepareError::Release(_) => Stage::Release,
        }
    }

    /// Returns `true` if the run was stopped by the existence check, before
    /// any decoder was opened or file written.
    pub fn is_input_not_found(&self) -> bool {
        matches!(self, PrepareError::InputNotFound { .. })
    }
}

impl From<FfmpegError> for PrepareError {
    fn from(error: FfmpegError) -> Self {
        PrepareError::FfmpegError(error.to_string())
    }
}
