//! Clip metadata types.
//!
//! [`ClipMetadata`] is read once when a [`FrameSource`](crate::FrameSource)
//! is opened and cached for the lifetime of the handle. Only the duration
//! drives the pipeline; the remaining fields are reported to the operator.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};

/// Metadata for an opened video clip.
///
/// # Example
///
/// ```no_run
/// use lastframe::{FrameSource, MediaFile};
///
/// let clip = MediaFile::open("input_clip.mp4").unwrap();
/// println!("{}", clip.metadata());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ClipMetadata {
    /// Total duration of the clip.
    pub duration: Duration,
    /// Average frame rate, or `None` when the container does not expose one.
    pub frames_per_second: Option<f64>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Video codec name (e.g. `"h264"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
    /// Audio stream metadata, if the clip carries audio.
    pub audio: Option<AudioMetadata>,
}

/// Metadata for the clip's audio stream.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct AudioMetadata {
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
    /// Codec name (e.g. `"aac"`).
    pub codec: String,
}

impl ClipMetadata {
    /// Frame rate formatted for display, `"unknown"` when not exposed.
    pub fn frame_rate_label(&self) -> String {
        match self.frames_per_second {
            Some(fps) => format!("{fps:.2}"),
            None => "unknown".to_string(),
        }
    }
}

impl Display for ClipMetadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Duration: {:.2}s, FPS: {}, Resolution: {}x{}",
            self.duration.as_secs_f64(),
            self.frame_rate_label(),
            self.width,
            self.height,
        )
    }
}
