//! Internal utility functions.
//!
//! Pixel copying and timestamp conversion shared by the FFmpeg video source.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 frame into a tightly packed buffer, dropping row padding.
pub fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Rescale a timestamp from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Stream start timestamp, or `0` when the container does not report one.
pub fn stream_start_pts(start_time: i64) -> i64 {
    if start_time == ffmpeg_next::ffi::AV_NOPTS_VALUE {
        0
    } else {
        start_time
    }
}

/// Rescale a timestamp to the nearest frame number, counting from the
/// stream's first timestamp `start_pts`.
///
/// Rounds rather than truncates, matching the range validator, so a frame
/// whose timestamp lands a hair below its nominal time keeps its index.
pub fn pts_to_frame_number(
    pts: i64,
    start_pts: i64,
    time_base: Rational,
    frames_per_second: f64,
) -> u64 {
    let relative = pts.saturating_sub(start_pts);
    let frame = (pts_to_seconds(relative, time_base) * frames_per_second).round();
    if frame > 0.0 { frame as u64 } else { 0 }
}

/// Convert a frame number to a container seek position in AV_TIME_BASE
/// (microseconds), as expected by `Input::seek`. `start_seconds` is the
/// stream's first timestamp, which frame 0 maps to.
pub fn frame_number_to_seek_timestamp(
    frame_number: u64,
    frames_per_second: f64,
    start_seconds: f64,
) -> i64 {
    let seconds = start_seconds + frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}
