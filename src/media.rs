//! FFmpeg-backed [`FrameSource`].
//!
//! [`MediaFile`] opens a container, reads [`ClipMetadata`] for the best
//! video stream, keeps a decoder for the best audio stream as its audio
//! sub-resource, and decodes single frames by timestamp.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Audio as AudioDecoder,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::DynamicImage;

use crate::{
    configuration::PixelFormat,
    conversion,
    error::PrepareError,
    metadata::{AudioMetadata, ClipMetadata},
    source::FrameSource,
};

/// An open video file.
///
/// Created via [`MediaFile::open`]. Metadata is read once at open time.
/// Both the demuxer and the audio decoder are released by
/// [`close`](FrameSource::close) / [`close_audio`](FrameSource::close_audio),
/// or on drop if those were never called.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use lastframe::{FrameSource, MediaFile, PixelFormat};
///
/// let mut clip = MediaFile::open("input_clip.mp4")?;
/// println!("{}", clip.metadata());
/// let frame = clip.frame_at(Duration::from_secs(1), PixelFormat::Rgb8)?;
/// frame.save("one_second.png")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MediaFile {
    input_context: Option<Input>,
    audio_decoder: Option<AudioDecoder>,
    video_stream_index: usize,
    metadata: ClipMetadata,
    file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("file_path", &self.file_path)
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("reader_open", &self.input_context.is_some())
            .field("audio_open", &self.audio_decoder.is_some())
            .finish()
    }
}

impl MediaFile {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, and reads
    /// metadata for the best video and audio streams.
    ///
    /// # Errors
    ///
    /// Returns [`PrepareError::FileOpen`] if the file cannot be opened or its
    /// codec parameters cannot be read, and [`PrepareError::NoVideoStream`]
    /// if it has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PrepareError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();
        let open_error = |reason: String| PrepareError::FileOpen {
            path: file_path.clone(),
            reason,
        };

        log::debug!("Opening media file: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let video_stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(PrepareError::NoVideoStream)?;
        let video_stream_index = video_stream.index();

        let video_decoder = CodecContext::from_parameters(video_stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| {
                open_error(format!(
                    "Failed to create video decoder for stream {video_stream_index}: {error}"
                ))
            })?;

        let frames_per_second = conversion::rational_to_fps(video_stream.avg_frame_rate())
            .or_else(|| conversion::rational_to_fps(video_stream.rate()));

        let duration = if input_context.duration() > 0 {
            Duration::from_micros(input_context.duration() as u64)
        } else if video_stream.duration() > 0 {
            conversion::stream_duration(video_stream.duration(), video_stream.time_base())
        } else {
            Duration::ZERO
        };

        let codec = video_decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let audio_decoder = match input_context.streams().best(Type::Audio) {
            Some(stream) => {
                let index = stream.index();
                match CodecContext::from_parameters(stream.parameters())
                    .and_then(|context| context.decoder().audio())
                {
                    Ok(decoder) => Some(decoder),
                    Err(error) => {
                        log::warn!("Ignoring undecodable audio stream {index}: {error}");
                        None
                    }
                }
            }
            None => None,
        };

        let audio = audio_decoder.as_ref().map(|decoder| AudioMetadata {
            sample_rate: decoder.rate(),
            channels: decoder.channels(),
            codec: decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        });

        let metadata = ClipMetadata {
            duration,
            frames_per_second,
            width: video_decoder.width(),
            height: video_decoder.height(),
            codec,
            format: input_context.format().name().to_string(),
            audio,
        };

        log::debug!(
            "Video stream {video_stream_index}: {}x{}, {} fps, codec={}, audio={}",
            metadata.width,
            metadata.height,
            metadata.frame_rate_label(),
            metadata.codec,
            metadata.audio.is_some(),
        );

        Ok(Self {
            input_context: Some(input_context),
            audio_decoder,
            video_stream_index,
            metadata,
            file_path,
        })
    }
}

impl FrameSource for MediaFile {
    fn metadata(&self) -> &ClipMetadata {
        &self.metadata
    }

    /// Seeks to the keyframe at or before `timestamp`, then decodes forward
    /// and returns the last frame whose presentation time is not after it.
    ///
    /// `timestamp` is relative to the first frame of the video stream, not
    /// to the container's absolute clock.
    fn frame_at(
        &mut self,
        timestamp: Duration,
        pixel_format: PixelFormat,
    ) -> Result<DynamicImage, PrepareError> {
        let duration = self.metadata.duration;
        if duration > Duration::ZERO && timestamp >= duration {
            return Err(PrepareError::InvalidTimestamp(timestamp));
        }

        let video_stream_index = self.video_stream_index;
        let (width, height) = (self.metadata.width, self.metadata.height);
        let target_seconds = timestamp.as_secs_f64();

        let input_context = self
            .input_context
            .as_mut()
            .ok_or_else(|| PrepareError::FrameDecode("reader is closed".to_string()))?;

        let stream = input_context
            .stream(video_stream_index)
            .ok_or(PrepareError::NoVideoStream)?;
        let time_base = stream.time_base();
        let start_seconds = conversion::start_offset_seconds(stream.start_time(), time_base);
        let mut decoder = CodecContext::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            pixel_format.to_ffmpeg_pixel(),
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let seek_timestamp = conversion::seek_timestamp(timestamp, start_seconds);
        log::debug!(
            "Seeking to {seek_timestamp}us for frame at {timestamp:?} (stream starts at {start_seconds}s)"
        );
        input_context.seek(seek_timestamp, ..seek_timestamp)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut converted_frame = VideoFrame::empty();
        let mut have_frame = false;
        let mut passed_target = false;

        for (stream, packet) in input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let frame_seconds =
                    presentation_seconds(&decoded_frame, time_base) - start_seconds;
                if frame_seconds <= target_seconds || !have_frame {
                    scaler.run(&decoded_frame, &mut converted_frame)?;
                    have_frame = true;
                }
                if frame_seconds > target_seconds {
                    passed_target = true;
                    break;
                }
            }
            if passed_target {
                break;
            }
        }

        if !passed_target {
            decoder.send_eof()?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let frame_seconds =
                    presentation_seconds(&decoded_frame, time_base) - start_seconds;
                if frame_seconds > target_seconds && have_frame {
                    break;
                }
                scaler.run(&decoded_frame, &mut converted_frame)?;
                have_frame = true;
            }
        }

        if !have_frame {
            return Err(PrepareError::FrameDecode(format!(
                "No frame decoded at or after {timestamp:?}"
            )));
        }

        let buffer = conversion::frame_to_buffer(
            &converted_frame,
            width,
            height,
            pixel_format.bytes_per_pixel(),
        );
        pixel_format.wrap_buffer(width, height, buffer).ok_or_else(|| {
            PrepareError::FrameDecode(
                "Decoded frame data does not match the stream dimensions".to_string(),
            )
        })
    }

    fn has_audio(&self) -> bool {
        self.audio_decoder.is_some()
    }

    fn close_audio(&mut self) -> Result<(), PrepareError> {
        let Some(mut decoder) = self.audio_decoder.take() else {
            return Ok(());
        };
        log::debug!("Closing audio decoder for {}", self.file_path.display());
        decoder
            .send_eof()
            .map_err(|error| PrepareError::Release(format!("audio decoder: {error}")))
    }

    fn close(&mut self) -> Result<(), PrepareError> {
        match self.input_context.take() {
            Some(input_context) => {
                log::debug!("Closing reader for {}", self.file_path.display());
                drop(input_context);
                Ok(())
            }
            None => Err(PrepareError::Release("reader already closed".to_string())),
        }
    }
}

/// Presentation time of a decoded frame, preferring the best-effort
/// timestamp over the raw PTS.
fn presentation_seconds(frame: &VideoFrame, time_base: Rational) -> f64 {
    let pts = frame.timestamp().or(frame.pts()).unwrap_or(0);
    conversion::pts_to_seconds(pts, time_base)
}
