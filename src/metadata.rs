//! Video metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoFile`](crate::VideoFile) is
//! opened and is everything the range validator needs to know about a video.

use std::time::Duration;

use crate::range::TimeInterval;

/// Metadata for the video stream of a source file.
///
/// # Example
///
/// ```no_run
/// use vidframes::VideoFile;
///
/// let video = VideoFile::open("recording.avi").unwrap();
/// let metadata = video.metadata();
/// println!("{:.2} fps, {} frames", metadata.frames_per_second, metadata.frame_count);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (average rate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Container duration.
    pub duration: Duration,
    /// Number of frames, `floor(frames_per_second * duration)`.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"mpeg2video"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Frame count implied by a frame rate and a duration.
    pub fn estimate_frame_count(frames_per_second: f64, duration: Duration) -> u64 {
        if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second).floor() as u64
        } else {
            0
        }
    }

    /// The interval spanning the whole video.
    pub fn whole_interval(&self) -> TimeInterval {
        TimeInterval::whole(self.frame_count as f64 / self.frames_per_second)
    }
}
