//! # vidframes
//!
//! Turn folders of raw video recordings into numbered directory trees of
//! still frames, ready to be used as an image dataset.
//!
//! ```text
//! dataset/
//! ├── Patient_001/
//! │   ├── Sequence_001/frame_0.png, frame_1.png, ...
//! │   └── Sequence_002/...
//! └── Patient_002/...
//! ```
//!
//! Subject and sequence numbers are allocated by scanning what is already on
//! disk, filling gaps before extending the numbering, so a dataset can grow
//! over several runs. Human-written time spans are turned into exact frame
//! ranges and checked against the video before anything is written. After a
//! video is converted it is moved to a `converted_files/` area next to it so
//! it is not converted twice.
//!
//! ## Quick Start
//!
//! ### Convert a folder of recordings
//!
//! ```no_run
//! use vidframes::{ExtractionConfig, Extractor};
//!
//! let extractor = Extractor::new("dataset", ExtractionConfig::new());
//! let report = extractor.convert_directory("raw_videos")?;
//! for failure in &report.failed {
//!     eprintln!("{}: {}", failure.source.display(), failure.error);
//! }
//! # Ok::<(), vidframes::VidframesError>(())
//! ```
//!
//! ### Cut annotated segments out of one recording
//!
//! ```no_run
//! use vidframes::{ExtractionConfig, Extractor, annotation};
//!
//! let stations = annotation::read_site_times("case_07_stations.csv")?;
//! let extractor = Extractor::new("dataset", ExtractionConfig::new());
//! let report = extractor.convert_segments("raw_videos/case_07.avi", &stations)?;
//! println!("{} sequences under {}", report.sequences.len(), report.subject.name);
//! # Ok::<(), vidframes::VidframesError>(())
//! ```
//!
//! ### Use the core pieces directly
//!
//! ```
//! use vidframes::{FrameRange, TimeInterval, next_identifier, validate_range};
//!
//! assert_eq!(next_identifier(&[1, 2, 4]).unwrap(), 3);
//!
//! let range = validate_range(&TimeInterval::new(17.4, 25.2), 25.0, 1000).unwrap();
//! assert_eq!(range, FrameRange::new(435, 630));
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed for `ffmpeg-next` to build.
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://crates.io/crates/log) facade.
//! FFmpeg's own console output is tuned separately with
//! [`set_ffmpeg_log_level`].

pub mod allocator;
pub mod annotation;
pub mod config;
pub mod directory;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod metadata;
pub mod progress;
pub mod range;
mod utilities;
pub mod video;

pub use allocator::next_identifier;
pub use annotation::{AnnotationEntry, AnnotationOptions};
pub use config::ExtractionConfig;
pub use directory::NumberedDirectory;
pub use error::VidframesError;
pub use extractor::{BatchReport, Extractor, SequenceReport, VideoFailure, VideoReport};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use range::{FrameRange, TimeInterval, validate_range};
pub use video::{FfmpegOpener, FrameHandler, FrameSource, VideoFile, VideoOpener};
