//! Error types for the `vidframes` crate.
//!
//! This module defines [`VidframesError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the paths, frame
//! numbers and annotation line numbers needed to tell which video or which
//! annotation row is at fault.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `vidframes` operations.
///
/// Range violations come in two flavours, [`FrameRangeOutOfBounds`] and
/// [`EmptyFrameRange`], so callers can report whether an annotation points
/// outside the video or is simply inverted.
///
/// [`FrameRangeOutOfBounds`]: VidframesError::FrameRangeOutOfBounds
/// [`EmptyFrameRange`]: VidframesError::EmptyFrameRange
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VidframesError {
    /// An identifier space contained a negative identifier.
    #[error("Invalid identifier {0}: identifiers must be non-negative")]
    InvalidIdentifier(i64),

    /// A directory matching a numbered prefix has no integer suffix.
    #[error("Directory {path} does not end in a numeric identifier")]
    UnnumberedEntry {
        /// Offending directory.
        path: PathBuf,
    },

    /// The rounded frame indices fall outside `[0, total_frames]`.
    #[error(
        "Frame range {start_frame}..{end_frame} is out of bounds (video has {total_frames} frames)"
    )]
    FrameRangeOutOfBounds {
        /// Rounded start frame.
        start_frame: i64,
        /// Rounded end frame (exclusive).
        end_frame: i64,
        /// Total number of frames in the video.
        total_frames: u64,
    },

    /// The rounded start frame is not before the rounded end frame.
    #[error("Frame range {start_frame}..{end_frame} is empty or inverted")]
    EmptyFrameRange {
        /// Rounded start frame.
        start_frame: i64,
        /// Rounded end frame (exclusive).
        end_frame: i64,
    },

    /// A time value was NaN or infinite.
    #[error("Invalid timestamp: {0} seconds")]
    InvalidTimestamp(f64),

    /// The frame rate was zero, negative, or not finite.
    #[error("Invalid frame rate: {0} fps")]
    InvalidFrameRate(f64),

    /// A non-empty frame range produced no frames at all.
    #[error("No frames could be decoded in frame range {start_frame}..{end_frame}")]
    NoFramesDecoded {
        /// First requested frame.
        start_frame: u64,
        /// One past the last requested frame.
        end_frame: u64,
    },

    /// A segment conversion was requested with no segments.
    #[error("No segments to extract from {path}")]
    NoSegments {
        /// The source video.
        path: PathBuf,
    },

    /// A frame stride of zero was provided.
    #[error("Frame interval must be greater than zero")]
    InvalidInterval,

    /// A directory or file that was about to be created already exists.
    #[error("Refusing to overwrite existing path {path}")]
    Collision {
        /// The path that already exists.
        path: PathBuf,
    },

    /// An annotation row could not be turned into a label and time interval.
    #[error("Malformed annotation at line {line}: {reason}")]
    MalformedAnnotation {
        /// One-based line number in the annotation file.
        line: usize,
        /// What was wrong with the row.
        reason: String,
    },

    /// The requested output image extension is not known to the `image` crate.
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while writing a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl VidframesError {
    /// Returns `true` for either kind of frame range violation.
    pub fn is_range_violation(&self) -> bool {
        matches!(
            self,
            VidframesError::FrameRangeOutOfBounds { .. } | VidframesError::EmptyFrameRange { .. }
        )
    }

    /// Returns `true` if the error is a refusal to overwrite an existing path.
    pub fn is_collision(&self) -> bool {
        matches!(self, VidframesError::Collision { .. })
    }
}

impl From<FfmpegError> for VidframesError {
    fn from(error: FfmpegError) -> Self {
        VidframesError::FfmpegError(error.to_string())
    }
}
