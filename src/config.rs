//! Extraction configuration.
//!
//! [`ExtractionConfig`] is a builder carrying everything the
//! [`Extractor`](crate::Extractor) needs besides the output root: frame
//! stride, image format, directory naming, which files count as videos,
//! whether sources are moved away after conversion, and progress reporting.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use vidframes::ExtractionConfig;
//!
//! let config = ExtractionConfig::new()
//!     .with_frame_interval(5)
//!     .with_image_extension("jpg")
//!     .with_subject_prefix("Subject")
//!     .with_video_extensions(["avi", "mpg", "mp4"]);
//! assert_eq!(config.frame_interval(), 5);
//! assert!(config.accepts_video(Path::new("case_01.MP4")));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

use image::ImageFormat;

use crate::{
    error::VidframesError,
    progress::{NoOpProgress, ProgressCallback},
};

/// Default prefix of subject directories (`Patient_001`).
pub const DEFAULT_SUBJECT_PREFIX: &str = "Patient";
/// Default prefix of sequence directories (`Sequence_001`).
pub const DEFAULT_SEQUENCE_PREFIX: &str = "Sequence";
/// Default name of the directory converted videos are moved into.
pub const DEFAULT_CONVERTED_DIR: &str = "converted_files";

/// Configuration for frame extraction.
#[derive(Clone)]
pub struct ExtractionConfig {
    pub(crate) frame_interval: u64,
    pub(crate) image_extension: String,
    pub(crate) subject_prefix: String,
    pub(crate) sequence_prefix: String,
    pub(crate) converted_dir: String,
    pub(crate) video_extensions: Vec<String>,
    pub(crate) relocate_sources: bool,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
}

impl Debug for ExtractionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionConfig")
            .field("frame_interval", &self.frame_interval)
            .field("image_extension", &self.image_extension)
            .field("subject_prefix", &self.subject_prefix)
            .field("sequence_prefix", &self.sequence_prefix)
            .field("converted_dir", &self.converted_dir)
            .field("video_extensions", &self.video_extensions)
            .field("relocate_sources", &self.relocate_sources)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionConfig {
    /// Create a configuration with default settings.
    ///
    /// Defaults: every frame, PNG output, `Patient`/`Sequence` prefixes,
    /// `converted_files`, `.avi` and `.mpg` inputs, sources relocated, no
    /// progress callback, batch size 1.
    pub fn new() -> Self {
        Self {
            frame_interval: 1,
            image_extension: "png".to_string(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            sequence_prefix: DEFAULT_SEQUENCE_PREFIX.to_string(),
            converted_dir: DEFAULT_CONVERTED_DIR.to_string(),
            video_extensions: vec!["avi".to_string(), "mpg".to_string()],
            relocate_sources: true,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Extract every `interval`-th frame. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_frame_interval(mut self, interval: u64) -> Self {
        self.frame_interval = interval.max(1);
        self
    }

    /// Set the output image extension (`png`, `jpg`, `bmp`, `tiff`, ...).
    /// A leading dot is ignored.
    #[must_use]
    pub fn with_image_extension(mut self, extension: &str) -> Self {
        self.image_extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Set the subject directory prefix.
    #[must_use]
    pub fn with_subject_prefix(mut self, prefix: &str) -> Self {
        self.subject_prefix = prefix.to_string();
        self
    }

    /// Set the sequence directory prefix.
    #[must_use]
    pub fn with_sequence_prefix(mut self, prefix: &str) -> Self {
        self.sequence_prefix = prefix.to_string();
        self
    }

    /// Set the name of the directory converted sources are moved into.
    #[must_use]
    pub fn with_converted_dir(mut self, name: &str) -> Self {
        self.converted_dir = name.to_string();
        self
    }

    /// Set which file extensions are treated as videos (case-insensitive).
    #[must_use]
    pub fn with_video_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.video_extensions = extensions
            .into_iter()
            .map(|extension| {
                extension
                    .as_ref()
                    .trim_start_matches('.')
                    .to_ascii_lowercase()
            })
            .collect();
        self
    }

    /// Control whether a source video is moved into the converted area after
    /// its frames are written. Defaults to `true`.
    #[must_use]
    pub fn with_relocate_sources(mut self, relocate: bool) -> Self {
        self.relocate_sources = relocate;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fire the progress callback every `size` items. Clamped to a minimum
    /// of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Frame stride.
    pub fn frame_interval(&self) -> u64 {
        self.frame_interval
    }

    /// Output image extension, without a dot.
    pub fn image_extension(&self) -> &str {
        &self.image_extension
    }

    /// Subject directory prefix.
    pub fn subject_prefix(&self) -> &str {
        &self.subject_prefix
    }

    /// Sequence directory prefix.
    pub fn sequence_prefix(&self) -> &str {
        &self.sequence_prefix
    }

    /// Name of the converted-files directory.
    pub fn converted_dir(&self) -> &str {
        &self.converted_dir
    }

    /// Whether sources are relocated after conversion.
    pub fn relocate_sources(&self) -> bool {
        self.relocate_sources
    }

    /// Returns `true` if `path` has one of the accepted video extensions.
    pub fn accepts_video(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                let extension = extension.to_ascii_lowercase();
                self.video_extensions.iter().any(|accepted| *accepted == extension)
            })
    }

    /// Resolve the configured image extension to an [`ImageFormat`].
    ///
    /// # Errors
    ///
    /// Returns [`VidframesError::UnsupportedImageFormat`] if the `image` crate
    /// does not recognise the extension.
    pub fn image_format(&self) -> Result<ImageFormat, VidframesError> {
        ImageFormat::from_extension(&self.image_extension)
            .ok_or_else(|| VidframesError::UnsupportedImageFormat(self.image_extension.clone()))
    }
}
