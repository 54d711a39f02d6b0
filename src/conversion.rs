//! Internal conversion helpers.
//!
//! Timestamp arithmetic between [`Duration`], FFmpeg time bases, and the
//! AV_TIME_BASE seek unit, plus packing of decoded pixel planes.

use std::time::Duration;

use ffmpeg_next::{Rational, ffi::AV_NOPTS_VALUE, frame::Video as VideoFrame};

const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// Timestamp at which the last frame of a clip is sampled.
///
/// Returns `duration - epsilon` when the clip is longer than `epsilon`,
/// otherwise zero. Requesting exactly `duration` would ask the decoder for a
/// frame past end-of-stream.
pub fn last_frame_timestamp(duration: Duration, epsilon: Duration) -> Duration {
    duration.saturating_sub(epsilon)
}

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// `bytes_per_pixel` is 3 for RGB24, 4 for RGBA, 1 for GRAY8. Row padding
/// (stride wider than `width * bytes_per_pixel`) is stripped.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        data.chunks(stride)
            .take(height as usize)
            .flat_map(|row| &row[..row_length])
            .copied()
            .collect()
    }
}

/// Absolute seek target in AV_TIME_BASE (microseconds) for a clip-relative
/// timestamp on a stream that starts at `start_seconds`.
///
/// `Input::seek` with no stream selected expects this unit.
pub(crate) fn seek_timestamp(timestamp: Duration, start_seconds: f64) -> i64 {
    ((timestamp.as_secs_f64() + start_seconds) * MICROSECONDS_PER_SECOND).round() as i64
}

/// Rescale a PTS value from a stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Start time of a stream in seconds. Unset or unusable values are 0.
pub(crate) fn start_offset_seconds(start_time: i64, time_base: Rational) -> f64 {
    if start_time == AV_NOPTS_VALUE {
        return 0.0;
    }
    let seconds = pts_to_seconds(start_time, time_base);
    if seconds.is_finite() { seconds } else { 0.0 }
}

/// Duration from a stream-level length in `time_base` units, zero when the
/// time base cannot express it.
pub(crate) fn stream_duration(length: i64, time_base: Rational) -> Duration {
    Duration::try_from_secs_f64(pts_to_seconds(length, time_base)).unwrap_or(Duration::ZERO)
}

/// Frames per second from a rational rate, `None` for a zero or unset rate.
pub(crate) fn rational_to_fps(rate: Rational) -> Option<f64> {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        None
    } else {
        Some(f64::from(rate.numerator()) / f64::from(rate.denominator()))
    }
}
