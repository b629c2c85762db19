//! Extraction driver.
//!
//! [`Extractor`] turns source videos into the dataset layout
//!
//! ```text
//! OUTPUT_ROOT/Patient_001/Sequence_001/frame_0.png
//!                                     /frame_1.png
//!                        /Sequence_002/...
//!            /Patient_002/...
//! ```
//!
//! and then moves each converted video into
//! `<input dir>/converted_files/Patient_NNN/` so a later run over the same
//! input directory does not convert it again.
//!
//! For every video the driver first resolves and validates all frame ranges,
//! then claims directories, writes frames, closes the decoder, and only then
//! relocates the source. A video that fails validation leaves no directories
//! behind.
//!
//! # Modes
//!
//! - [`convert_video`](Extractor::convert_video): one video, one subject, one
//!   sequence.
//! - [`convert_segments`](Extractor::convert_segments): one video, one subject,
//!   one sequence per annotated span.
//! - [`convert_directory`](Extractor::convert_directory): every video of a
//!   directory, one subject each.
//! - [`convert_grouped`](Extractor::convert_grouped): videos sharing a key
//!   become sequences of the same subject.
//! - [`convert_trimmed`](Extractor::convert_trimmed): a clip trim list naming
//!   videos and the span to keep from each.

use std::{
    collections::BTreeMap,
    fs,
    io::{Error as IoError, ErrorKind},
    path::{Path, PathBuf},
};

use image::ImageFormat;

use crate::{
    annotation::AnnotationEntry,
    config::ExtractionConfig,
    directory::{NumberedDirectory, claim_next},
    error::VidframesError,
    progress::{OperationType, ProgressTracker},
    range::{FrameRange, TimeInterval, validate_range},
    video::{FfmpegOpener, FrameSource, VideoOpener},
};

/// File name of the `index`-th frame written into a sequence directory.
///
/// ```
/// use vidframes::extractor::frame_file_name;
///
/// assert_eq!(frame_file_name(0, "png"), "frame_0.png");
/// ```
pub fn frame_file_name(index: u64, extension: &str) -> String {
    format!("frame_{index}.{extension}")
}

/// Outcome of writing one sequence directory.
#[derive(Debug, Clone)]
pub struct SequenceReport {
    /// The sequence directory.
    pub directory: NumberedDirectory,
    /// Annotation label the sequence was cut from, if any.
    pub label: Option<String>,
    /// Source frames the sequence was taken from.
    pub range: FrameRange,
    /// Number of image files written.
    pub frames_written: u64,
}

/// Outcome of converting one source video.
#[derive(Debug, Clone)]
pub struct VideoReport {
    /// The source video as it was found.
    pub source: PathBuf,
    /// Subject directory the sequences were written under.
    pub subject: NumberedDirectory,
    /// Sequences written from this video, in order.
    pub sequences: Vec<SequenceReport>,
    /// Where the source was moved to, if relocation is enabled.
    pub relocated_to: Option<PathBuf>,
}

impl VideoReport {
    /// Total frames written for this video.
    pub fn frames_written(&self) -> u64 {
        self.sequences.iter().map(|sequence| sequence.frames_written).sum()
    }
}

/// A video that could not be converted.
#[derive(Debug)]
pub struct VideoFailure {
    /// The source video.
    pub source: PathBuf,
    /// Why it failed.
    pub error: VidframesError,
}

/// Outcome of a batch conversion.
///
/// Failures do not stop a batch; each failed video is listed here and keeps
/// its place in the input directory for a later run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Videos converted successfully, in processing order.
    pub converted: Vec<VideoReport>,
    /// Videos that failed, in processing order.
    pub failed: Vec<VideoFailure>,
}

impl BatchReport {
    /// Returns `true` if no video failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total frames written across the batch.
    pub fn frames_written(&self) -> u64 {
        self.converted.iter().map(VideoReport::frames_written).sum()
    }

    fn record(&mut self, source: &Path, result: Result<VideoReport, VidframesError>) {
        match result {
            Ok(report) => self.converted.push(report),
            Err(error) => {
                log::warn!("Failed to convert {}: {error}", source.display());
                self.failed.push(VideoFailure {
                    source: source.to_path_buf(),
                    error,
                });
            }
        }
    }
}

/// One sequence to cut from a video: an optional label and an optional span
/// (`None` means the whole video).
struct Segment<'a> {
    label: Option<&'a str>,
    interval: Option<TimeInterval>,
}

/// Converts source videos into numbered frame directories.
///
/// # Example
///
/// ```no_run
/// use vidframes::{ExtractionConfig, Extractor};
///
/// let extractor = Extractor::new("dataset", ExtractionConfig::new().with_frame_interval(5));
/// let report = extractor.convert_directory("raw_videos")?;
/// println!(
///     "{} videos converted, {} failed",
///     report.converted.len(),
///     report.failed.len()
/// );
/// # Ok::<(), vidframes::VidframesError>(())
/// ```
#[derive(Debug)]
pub struct Extractor<O: VideoOpener = FfmpegOpener> {
    output_root: PathBuf,
    config: ExtractionConfig,
    opener: O,
}

impl Extractor<FfmpegOpener> {
    /// Create an extractor writing under `output_root`, decoding with FFmpeg.
    pub fn new<P: AsRef<Path>>(output_root: P, config: ExtractionConfig) -> Self {
        Self::with_opener(output_root, config, FfmpegOpener)
    }
}

impl<O: VideoOpener> Extractor<O> {
    /// Create an extractor with a custom video opener.
    pub fn with_opener<P: AsRef<Path>>(output_root: P, config: ExtractionConfig, opener: O) -> Self {
        Self {
            output_root: output_root.as_ref().to_path_buf(),
            config,
            opener,
        }
    }

    /// Root directory subjects are created in.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// The active configuration.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// List the videos in `input_dir`, sorted by file name.
    ///
    /// Only regular files with an accepted extension are returned, so the
    /// converted-files directory is never rescanned.
    ///
    /// # Errors
    ///
    /// Returns [`VidframesError::IoError`] if the directory cannot be listed.
    pub fn list_videos<P: AsRef<Path>>(&self, input_dir: P) -> Result<Vec<PathBuf>, VidframesError> {
        let mut videos = Vec::new();
        for entry in fs::read_dir(input_dir.as_ref())? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && self.config.accepts_video(&path) {
                videos.push(path);
            }
        }
        videos.sort();
        Ok(videos)
    }

    /// Claim the next subject directory under the output root.
    ///
    /// # Errors
    ///
    /// See [`claim_next`].
    pub fn claim_subject(&self) -> Result<NumberedDirectory, VidframesError> {
        claim_next(&self.output_root, &self.config.subject_prefix)
    }

    /// Write the frames of `range` from `source` into a new sequence directory
    /// under `subject`.
    ///
    /// Frames are named `frame_0`, `frame_1`, ... in write order, independent
    /// of their index in the source video.
    ///
    /// # Errors
    ///
    /// - [`VidframesError::UnsupportedImageFormat`] for an unknown extension.
    /// - [`VidframesError::Collision`] if a frame file already exists.
    /// - [`VidframesError::NoFramesDecoded`] if the source delivered nothing
    ///   for a non-empty range. The empty sequence directory is left behind.
    /// - Decoding, image and I/O errors. Frames written before the error stay
    ///   on disk.
    pub fn extract_sequence(
        &self,
        source: &mut O::Source,
        subject: &NumberedDirectory,
        range: FrameRange,
        label: Option<&str>,
    ) -> Result<SequenceReport, VidframesError> {
        let format = self.config.image_format()?;
        let sequence = claim_next(&subject.path, &self.config.sequence_prefix)?;
        let frames_written = self
            .write_frames(source, &sequence, range, format)
            .inspect_err(|_| {
                log::warn!(
                    "Sequence {} is incomplete after an error",
                    sequence.path.display()
                );
            })?;

        log::info!(
            "Wrote {frames_written} frames from {range} to {}",
            sequence.path.display()
        );

        Ok(SequenceReport {
            directory: sequence,
            label: label.map(str::to_string),
            range,
            frames_written,
        })
    }

    fn write_frames(
        &self,
        source: &mut O::Source,
        sequence: &NumberedDirectory,
        range: FrameRange,
        format: ImageFormat,
    ) -> Result<u64, VidframesError> {
        let stride = self.config.frame_interval;
        let expected = range.selected_count(stride);
        let extension = &self.config.image_extension;

        let mut tracker = ProgressTracker::new(
            self.config.progress.clone(),
            OperationType::FrameExport,
            Some(expected),
            self.config.batch_size,
        );

        let mut written = 0_u64;
        source.for_each_frame(range, stride, &mut |frame_number, image| {
            let path = sequence.path.join(frame_file_name(written, extension));
            if path.exists() {
                return Err(VidframesError::Collision { path });
            }
            image.save_with_format(&path, format)?;
            written += 1;
            tracker.advance(Some(frame_number));
            Ok(())
        })?;
        tracker.finish();

        if written == 0 && expected > 0 {
            return Err(VidframesError::NoFramesDecoded {
                start_frame: range.start,
                end_frame: range.end,
            });
        }
        if written < expected {
            log::warn!(
                "Expected {expected} frames in {range} but the stream ended after {written}"
            );
        }

        Ok(written)
    }

    /// Move a converted video into `<video dir>/<converted dir>/<subject>/`.
    ///
    /// The converted area is created as needed and shared by all videos of a
    /// subject.
    ///
    /// # Errors
    ///
    /// - [`VidframesError::Collision`] if a file with the same name was already
    ///   moved there.
    /// - [`VidframesError::IoError`] if the move fails.
    pub fn relocate_source(
        &self,
        video: &Path,
        subject: &NumberedDirectory,
    ) -> Result<PathBuf, VidframesError> {
        let file_name = video.file_name().ok_or_else(|| {
            IoError::new(
                ErrorKind::InvalidInput,
                format!("{} has no file name", video.display()),
            )
        })?;
        let input_dir = video.parent().unwrap_or_else(|| Path::new(""));
        let area = input_dir
            .join(&self.config.converted_dir)
            .join(&subject.name);
        fs::create_dir_all(&area)?;

        let target = area.join(file_name);
        if target.exists() {
            return Err(VidframesError::Collision { path: target });
        }

        match fs::rename(video, &target) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::CrossesDevices => {
                fs::copy(video, &target)?;
                fs::remove_file(video)?;
            }
            Err(error) => return Err(error.into()),
        }

        log::info!("Moved {} to {}", video.display(), target.display());
        Ok(target)
    }

    /// Convert one video into a new subject with a single sequence.
    ///
    /// `interval` selects a span of the video; `None` converts all of it.
    ///
    /// # Errors
    ///
    /// Open, range, collision, decode and I/O errors. Range errors are
    /// reported before any directory is created.
    pub fn convert_video<P: AsRef<Path>>(
        &self,
        video: P,
        interval: Option<TimeInterval>,
    ) -> Result<VideoReport, VidframesError> {
        self.process_video(video.as_ref(), None, &[Segment {
            label: None,
            interval,
        }])
    }

    /// Convert one video into a new subject with one sequence per annotation
    /// entry, in entry order.
    ///
    /// Every entry is validated against the video before anything is written;
    /// one bad entry rejects the whole video.
    ///
    /// # Errors
    ///
    /// [`VidframesError::NoSegments`] if `entries` is empty, otherwise see
    /// [`convert_video`](Extractor::convert_video).
    pub fn convert_segments<P: AsRef<Path>>(
        &self,
        video: P,
        entries: &[AnnotationEntry],
    ) -> Result<VideoReport, VidframesError> {
        let segments: Vec<Segment<'_>> = entries
            .iter()
            .map(|entry| Segment {
                label: Some(entry.label.as_str()),
                interval: Some(entry.interval),
            })
            .collect();
        self.process_video(video.as_ref(), None, &segments)
    }

    /// Convert every video in `input_dir`, one subject per video.
    ///
    /// # Errors
    ///
    /// Only fails if the directory cannot be listed; per-video failures are
    /// collected in the [`BatchReport`].
    pub fn convert_directory<P: AsRef<Path>>(
        &self,
        input_dir: P,
    ) -> Result<BatchReport, VidframesError> {
        let videos = self.list_videos(input_dir)?;
        let mut tracker = self.batch_tracker(videos.len());
        let mut report = BatchReport::default();

        for video in &videos {
            report.record(video, self.convert_video(video, None));
            tracker.advance(None);
        }
        tracker.finish();

        Ok(report)
    }

    /// Convert every video in `input_dir`, putting videos with the same
    /// `group_key` under one subject, one sequence per video.
    ///
    /// Groups are processed in key order and videos within a group in file
    /// name order. A group's subject is claimed by its first video that
    /// passes validation.
    ///
    /// # Errors
    ///
    /// Only fails if the directory cannot be listed.
    pub fn convert_grouped<P, F>(
        &self,
        input_dir: P,
        group_key: F,
    ) -> Result<BatchReport, VidframesError>
    where
        P: AsRef<Path>,
        F: Fn(&Path) -> String,
    {
        let videos = self.list_videos(input_dir)?;
        let mut tracker = self.batch_tracker(videos.len());

        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for video in videos {
            groups.entry(group_key(&video)).or_default().push(video);
        }

        let mut report = BatchReport::default();
        for (key, videos) in &groups {
            log::debug!("Converting group {key:?} ({} videos)", videos.len());
            let mut subject: Option<NumberedDirectory> = None;
            for video in videos {
                let whole = [Segment {
                    label: None,
                    interval: None,
                }];
                let result = self.process_video(video, subject.as_ref(), &whole);
                if let Ok(converted) = &result {
                    subject.get_or_insert_with(|| converted.subject.clone());
                }
                report.record(video, result);
                tracker.advance(None);
            }
        }
        tracker.finish();

        Ok(report)
    }

    /// Convert the videos named by a clip trim list.
    ///
    /// Each entry's label is a file name inside `input_dir`; the video becomes
    /// one subject with one sequence covering the entry's span. Entries naming
    /// a missing file are reported as failures.
    ///
    /// # Errors
    ///
    /// Never fails as a whole; see the [`BatchReport`].
    pub fn convert_trimmed<P: AsRef<Path>>(
        &self,
        input_dir: P,
        trims: &[AnnotationEntry],
    ) -> Result<BatchReport, VidframesError> {
        let input_dir = input_dir.as_ref();
        let mut tracker = self.batch_tracker(trims.len());
        let mut report = BatchReport::default();

        for entry in trims {
            let video = input_dir.join(&entry.label);
            let result = if video.is_file() {
                self.process_video(&video, None, &[Segment {
                    label: Some(entry.label.as_str()),
                    interval: Some(entry.interval),
                }])
            } else {
                Err(IoError::new(
                    ErrorKind::NotFound,
                    format!("{} listed in trim list but not found", video.display()),
                )
                .into())
            };
            report.record(&video, result);
            tracker.advance(None);
        }
        tracker.finish();

        Ok(report)
    }

    fn batch_tracker(&self, total: usize) -> ProgressTracker {
        ProgressTracker::new(
            self.config.progress.clone(),
            OperationType::BatchConversion,
            Some(total as u64),
            1,
        )
    }

    /// Validate, claim, write, close, relocate.
    fn process_video(
        &self,
        video: &Path,
        subject: Option<&NumberedDirectory>,
        segments: &[Segment<'_>],
    ) -> Result<VideoReport, VidframesError> {
        log::debug!("Converting {}", video.display());
        if segments.is_empty() {
            return Err(VidframesError::NoSegments {
                path: video.to_path_buf(),
            });
        }
        self.config.image_format()?;

        let mut source = self.opener.open(video)?;
        let metadata = source.metadata().clone();

        let ranges = segments
            .iter()
            .map(|segment| {
                let interval = segment
                    .interval
                    .unwrap_or_else(|| metadata.whole_interval());
                validate_range(&interval, metadata.frames_per_second, metadata.frame_count)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let subject = match subject {
            Some(subject) => subject.clone(),
            None => self.claim_subject()?,
        };

        let mut sequences = Vec::with_capacity(segments.len());
        for (segment, range) in segments.iter().zip(ranges) {
            sequences.push(self.extract_sequence(&mut source, &subject, range, segment.label)?);
        }

        // The decoder must be closed before the file is moved.
        drop(source);

        let relocated_to = if self.config.relocate_sources {
            Some(self.relocate_source(video, &subject)?)
        } else {
            None
        };

        Ok(VideoReport {
            source: video.to_path_buf(),
            subject,
            sequences,
            relocated_to,
        })
    }
}
