//! # lastframe
//!
//! Grab the final frame of a video clip and write the two text templates a
//! person fills in before asking an AI video generator for a continuation.
//!
//! A run is a fixed sequence: check the input exists, open it with FFmpeg
//! (via [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), report its
//! metadata, decode the frame just before the end, save it as an image, write
//! `clip_analysis.txt` and `ai_prompt.txt`, and release the decoder.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lastframe::PrepareOptions;
//!
//! let options = PrepareOptions::new("input_clip.mp4").with_output_dir("handoff");
//! let artifacts = lastframe::prepare(&options)?;
//! println!(
//!     "{}x{} frame at {:.2}s -> {}",
//!     artifacts.frame_width,
//!     artifacts.frame_height,
//!     artifacts.sampled_at.as_secs_f64(),
//!     artifacts.frame_path.display(),
//! );
//! # Ok::<(), lastframe::PrepareError>(())
//! ```
//!
//! ## Outputs
//!
//! | File | Contents |
//! |------|----------|
//! | `last_frame.png` | the sampled frame at native resolution |
//! | `clip_analysis.txt` | fixed questionnaire: tone, visuals, last frame, audio |
//! | `ai_prompt.txt` | prompt scaffold naming the source clip, with a worked example |
//!
//! Every output is overwritten on each run.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod media;
pub mod metadata;
pub mod prepare;
pub mod progress;
pub mod release;
pub mod source;
pub mod templates;

pub use configuration::{PixelFormat, PrepareOptions};
pub use conversion::last_frame_timestamp;
pub use error::{PrepareError, Stage};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use media::MediaFile;
pub use metadata::{AudioMetadata, ClipMetadata};
pub use prepare::{PreparedArtifacts, inspect, inspect_with, prepare, prepare_with};
pub use progress::{ProgressCallback, ProgressInfo};
pub use release::ReleaseGuard;
pub use source::FrameSource;
