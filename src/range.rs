//! Time intervals and validated frame ranges.
//!
//! A [`TimeInterval`] is a span of a video expressed in seconds, as written by
//! a human in an annotation file. [`validate_range`] turns it into a
//! [`FrameRange`], a half-open `[start, end)` span of frame indices that is
//! guaranteed to lie inside the video, before any frame is decoded.
//!
//! # Rounding
//!
//! Seconds are converted with `(seconds * fps).round()`, i.e. round half away
//! from zero. `17.4 s` at 25 fps is frame 435; `0.1 s` at 25 fps (2.5 frames)
//! is frame 3.
//!
//! # Example
//!
//! ```
//! use vidframes::{FrameRange, TimeInterval, validate_range};
//!
//! let interval = TimeInterval::new(17.4, 25.2);
//! let range = validate_range(&interval, 25.0, 10_000).unwrap();
//! assert_eq!(range, FrameRange::new(435, 630));
//! assert_eq!(range.len(), 195);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::VidframesError;

/// A `(start, end)` span in seconds.
///
/// `start < end` is expected but not enforced here; [`validate_range`] rejects
/// inverted spans once they are rounded to frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInterval {
    start: f64,
    end: f64,
}

impl TimeInterval {
    /// Create an interval from start and end times in seconds.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// The interval covering a whole video of the given duration.
    pub fn whole(duration_seconds: f64) -> Self {
        Self::new(0.0, duration_seconds)
    }

    /// Start time in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End time in seconds.
    pub fn end(&self) -> f64 {
        self.end
    }
}

impl Display for TimeInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}s..{}s", self.start, self.end)
    }
}

/// A half-open `[start, end)` range of frame indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRange {
    /// First frame to extract.
    pub start: u64,
    /// One past the last frame to extract.
    pub end: u64,
}

impl FrameRange {
    /// Create a range without validation. Use [`validate_range`] for ranges
    /// derived from user input.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of frames covered by the range.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range covers no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `frame_number` lies inside the range.
    pub fn contains(&self, frame_number: u64) -> bool {
        (self.start..self.end).contains(&frame_number)
    }

    /// Number of frames selected when taking every `stride`-th frame.
    pub fn selected_count(&self, stride: u64) -> u64 {
        let stride = stride.max(1);
        self.len().div_ceil(stride)
    }

    /// Returns `true` if `frame_number` is inside the range and lands on the
    /// stride grid anchored at `start`.
    pub fn selects(&self, frame_number: u64, stride: u64) -> bool {
        self.contains(frame_number) && (frame_number - self.start) % stride.max(1) == 0
    }
}

impl Display for FrameRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Convert seconds to a frame index, rounding half away from zero.
pub fn seconds_to_frame(seconds: f64, frames_per_second: f64) -> i64 {
    (seconds * frames_per_second).round() as i64
}

/// Resolve a time interval into a frame range inside a video.
///
/// `frames_per_second` must be positive and `total_frames` is the number of
/// decodable frames. The result satisfies
/// `0 <= start < end <= total_frames`.
///
/// Nothing is clamped: an interval reaching past the end of the video is an
/// error, not a shorter clip.
///
/// # Errors
///
/// - [`VidframesError::InvalidFrameRate`] if `frames_per_second` is not a
///   positive finite number.
/// - [`VidframesError::InvalidTimestamp`] if either time is NaN or infinite.
/// - [`VidframesError::FrameRangeOutOfBounds`] if the rounded start is not in
///   `[0, total_frames)` or the rounded end is not in `(0, total_frames]`.
/// - [`VidframesError::EmptyFrameRange`] if both ends are in bounds but
///   `start >= end`.
pub fn validate_range(
    interval: &TimeInterval,
    frames_per_second: f64,
    total_frames: u64,
) -> Result<FrameRange, VidframesError> {
    if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
        return Err(VidframesError::InvalidFrameRate(frames_per_second));
    }
    for seconds in [interval.start, interval.end] {
        if !seconds.is_finite() {
            return Err(VidframesError::InvalidTimestamp(seconds));
        }
    }

    let start_frame = seconds_to_frame(interval.start, frames_per_second);
    let end_frame = seconds_to_frame(interval.end, frames_per_second);
    let total = i64::try_from(total_frames).unwrap_or(i64::MAX);

    let start_in_bounds = 0 <= start_frame && start_frame < total;
    let end_in_bounds = 0 < end_frame && end_frame <= total;
    if !(start_in_bounds && end_in_bounds) {
        return Err(VidframesError::FrameRangeOutOfBounds {
            start_frame,
            end_frame,
            total_frames,
        });
    }

    if start_frame >= end_frame {
        return Err(VidframesError::EmptyFrameRange {
            start_frame,
            end_frame,
        });
    }

    Ok(FrameRange::new(start_frame as u64, end_frame as u64))
}
