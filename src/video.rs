//! Video sources.
//!
//! [`VideoFile`] opens a recording with FFmpeg, reads its [`VideoMetadata`],
//! and decodes a [`FrameRange`] into [`image::DynamicImage`] values. The
//! extraction driver talks to it through the [`FrameSource`] and
//! [`VideoOpener`] traits, so other decoders (or synthetic sources in tests)
//! can stand in for FFmpeg.
//!
//! The demuxer is closed when the `VideoFile` is dropped.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{error::VidframesError, metadata::VideoMetadata, range::FrameRange, utilities};

/// Callback receiving `(source frame number, image)` for each selected frame.
pub type FrameHandler<'a> = dyn FnMut(u64, DynamicImage) -> Result<(), VidframesError> + 'a;

/// Something that can decode frames of one video.
pub trait FrameSource {
    /// Metadata of the video being decoded.
    fn metadata(&self) -> &VideoMetadata;

    /// Decode every `stride`-th frame of `range`, in order, and pass each to
    /// `handler`. Returns the number of frames delivered, which can be lower
    /// than requested if the stream ends early.
    ///
    /// Calls on the same source may come in any order; each call starts
    /// from `range.start` regardless of where the previous one stopped.
    ///
    /// # Errors
    ///
    /// Returns [`VidframesError::InvalidInterval`] for a zero stride, decoding
    /// errors, or the first error returned by `handler`.
    fn for_each_frame(
        &mut self,
        range: FrameRange,
        stride: u64,
        handler: &mut FrameHandler<'_>,
    ) -> Result<u64, VidframesError>;
}

/// Opens video files as [`FrameSource`]s.
pub trait VideoOpener {
    /// The source type produced.
    type Source: FrameSource;

    /// Open the video at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not a readable video.
    fn open(&self, path: &Path) -> Result<Self::Source, VidframesError>;
}

/// Opens videos with FFmpeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl VideoOpener for FfmpegOpener {
    type Source = VideoFile;

    fn open(&self, path: &Path) -> Result<VideoFile, VidframesError> {
        VideoFile::open(path)
    }
}

/// An opened video file.
///
/// # Example
///
/// ```no_run
/// use vidframes::{FrameSource, TimeInterval, VideoFile, validate_range};
///
/// let mut video = VideoFile::open("recording.avi")?;
/// let metadata = video.metadata().clone();
/// let range = validate_range(
///     &TimeInterval::new(2.0, 4.0),
///     metadata.frames_per_second,
///     metadata.frame_count,
/// )?;
/// video.for_each_frame(range, 1, &mut |frame_number, image| {
///     image.save(format!("frame_{frame_number}.png"))?;
///     Ok(())
/// })?;
/// # Ok::<(), vidframes::VidframesError>(())
/// ```
pub struct VideoFile {
    input_context: Input,
    stream_index: usize,
    start_pts: i64,
    metadata: VideoMetadata,
    path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("stream_index", &self.stream_index)
            .field("start_pts", &self.start_pts)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file and read its metadata.
    ///
    /// # Errors
    ///
    /// - [`VidframesError::FileOpen`] if FFmpeg cannot open the file or build a
    ///   decoder for its video stream.
    /// - [`VidframesError::NoVideoStream`] if the file has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VidframesError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video file: {}", path.display());

        let open_error = |reason: String| VidframesError::FileOpen {
            path: path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;
        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(VidframesError::NoVideoStream)?;
        let stream_index = stream.index();
        let start_pts = utilities::stream_start_pts(stream.start_time());

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        let frames_per_second = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            duration,
            frame_count: VideoMetadata::estimate_frame_count(frames_per_second, duration),
            codec,
        };

        log::info!(
            "Opened {}: {}x{} @ {:.3} fps, {:.2}s, ~{} frames, codec={}",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.duration.as_secs_f64(),
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            stream_index,
            start_pts,
            metadata,
            path,
        })
    }

    /// Path the video was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for VideoFile {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn for_each_frame(
        &mut self,
        range: FrameRange,
        stride: u64,
        handler: &mut FrameHandler<'_>,
    ) -> Result<u64, VidframesError> {
        if stride == 0 {
            return Err(VidframesError::InvalidInterval);
        }
        if range.is_empty() {
            return Ok(0);
        }

        log::debug!(
            "Decoding frames {range} every {stride} from {}",
            self.path.display()
        );

        let stream = self
            .input_context
            .stream(self.stream_index)
            .ok_or(VidframesError::NoVideoStream)?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let mut selection = FrameSelection {
            range,
            stride,
            time_base,
            start_pts: self.start_pts,
            frames_per_second: self.metadata.frames_per_second,
            width: self.metadata.width,
            height: self.metadata.height,
            scaler: ScalingContext::get(
                decoder.format(),
                decoder.width(),
                decoder.height(),
                Pixel::RGB24,
                self.metadata.width,
                self.metadata.height,
                ScalingFlags::BILINEAR,
            )?,
            rgb_frame: VideoFrame::empty(),
            next_frame_number: 0,
            delivered: 0,
        };

        // The demuxer is wherever the previous call stopped, so reposition it
        // even when the range starts at frame 0.
        let position = utilities::frame_number_to_seek_timestamp(
            range.start,
            self.metadata.frames_per_second,
            utilities::pts_to_seconds(self.start_pts, time_base),
        );
        self.input_context.seek(position, ..position)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut finished = false;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if selection.offer(&decoded_frame, handler)? {
                    finished = true;
                    break;
                }
            }
            if finished {
                break;
            }
        }

        if !finished {
            decoder.send_eof()?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if selection.offer(&decoded_frame, handler)? {
                    break;
                }
            }
        }

        Ok(selection.delivered)
    }
}

/// Per-call decoding state: which frames to keep and how to convert them.
struct FrameSelection {
    range: FrameRange,
    stride: u64,
    time_base: Rational,
    start_pts: i64,
    frames_per_second: f64,
    width: u32,
    height: u32,
    scaler: ScalingContext,
    rgb_frame: VideoFrame,
    next_frame_number: u64,
    delivered: u64,
}

impl FrameSelection {
    /// Hand a decoded frame to `handler` if it is selected. Returns `true`
    /// once the end of the range has been reached.
    fn offer(
        &mut self,
        decoded_frame: &VideoFrame,
        handler: &mut FrameHandler<'_>,
    ) -> Result<bool, VidframesError> {
        let frame_number = match decoded_frame.timestamp().or(decoded_frame.pts()) {
            Some(pts) => utilities::pts_to_frame_number(
                pts,
                self.start_pts,
                self.time_base,
                self.frames_per_second,
            ),
            None => self.next_frame_number,
        };

        // Timestamps that round onto an already seen index are repeats.
        if frame_number < self.next_frame_number {
            return Ok(false);
        }
        self.next_frame_number = frame_number + 1;

        if frame_number >= self.range.end {
            return Ok(true);
        }

        if self.range.selects(frame_number, self.stride) {
            self.scaler.run(decoded_frame, &mut self.rgb_frame)?;
            let image = convert_frame_to_image(&self.rgb_frame, self.width, self.height)?;
            handler(frame_number, image)?;
            self.delivered += 1;
        }

        Ok(false)
    }
}

fn rational_to_f64(rate: Rational) -> Option<f64> {
    if rate.numerator() > 0 && rate.denominator() > 0 {
        Some(rate.numerator() as f64 / rate.denominator() as f64)
    } else {
        None
    }
}

fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, VidframesError> {
    let buffer = utilities::frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        VidframesError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}
