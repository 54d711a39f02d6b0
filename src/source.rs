//! The decoding-layer seam.
//!
//! [`FrameSource`] is what the pipeline needs from an open video: cached
//! metadata, one frame at a timestamp, and a two-part close. [`MediaFile`]
//! is the FFmpeg implementation; tests substitute their own to inject
//! decode or close failures.
//!
//! [`MediaFile`]: crate::MediaFile

use std::time::Duration;

use image::DynamicImage;

use crate::{configuration::PixelFormat, error::PrepareError, metadata::ClipMetadata};

/// An open decoding session over a single video.
pub trait FrameSource {
    /// Metadata read when the source was opened.
    fn metadata(&self) -> &ClipMetadata;

    /// Decode the frame displayed at `timestamp` at native resolution.
    ///
    /// # Errors
    ///
    /// Returns [`PrepareError::InvalidTimestamp`] for a timestamp outside the
    /// clip, or [`PrepareError::FrameDecode`] when no frame can be produced.
    fn frame_at(
        &mut self,
        timestamp: Duration,
        pixel_format: PixelFormat,
    ) -> Result<DynamicImage, PrepareError>;

    /// Whether an audio sub-resource is currently open.
    fn has_audio(&self) -> bool;

    /// Close the audio sub-resource. A no-op when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`PrepareError::Release`] if the close fails.
    fn close_audio(&mut self) -> Result<(), PrepareError>;

    /// Close the underlying reader.
    ///
    /// # Errors
    ///
    /// Returns [`PrepareError::Release`] if the close fails or the reader
    /// was already closed.
    fn close(&mut self) -> Result<(), PrepareError>;
}
