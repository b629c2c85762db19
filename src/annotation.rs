//! Annotation files.
//!
//! Annotations are `;`-delimited text files with one time span per line:
//!
//! ```text
//! 4R;17.4;25.2
//! 4L;34.1;39.5
//! 7L;126.3;141.8
//! ```
//!
//! The first field is a label (an anatomical site, a clip name, or a video
//! file name), followed by start and end times in seconds. Whitespace after a
//! delimiter is ignored. Whether the file starts with a header row is not
//! detected; callers say so through [`AnnotationOptions`].
//!
//! Two layouts are common enough to have presets:
//!
//! - [`read_site_times`]: no header, one labelled span per line.
//! - [`read_clip_trims`]: a header row, then `video file;start;end` per line.

use std::{fs, path::Path};

use crate::{error::VidframesError, range::TimeInterval};

/// Field delimiter used by annotation files.
pub const DELIMITER: char = ';';

/// A labelled time span read from one annotation row.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationEntry {
    /// Clip, site, or file name.
    pub label: String,
    /// Span of the video the label refers to.
    pub interval: TimeInterval,
}

/// How to treat the first row of an annotation file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationOptions {
    /// The first row is a header.
    pub has_header: bool,
    /// Keep the header row as data instead of skipping it.
    pub include_header: bool,
}

impl AnnotationOptions {
    /// Options for a file without a header row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare whether the first row is a header.
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Keep the header row in the output. Only meaningful with a header.
    #[must_use]
    pub fn include_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    fn skips_first_row(&self) -> bool {
        self.has_header && !self.include_header
    }
}

/// A raw row: its one-based line number and its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// One-based line number in the source text.
    pub line: usize,
    /// Fields, with whitespace after each delimiter removed.
    pub fields: Vec<String>,
}

/// Split annotation text into rows.
///
/// Blank lines are dropped. When `options` says the first row is a header and
/// it should not be kept, it is dropped too.
pub fn split_rows(text: &str, options: &AnnotationOptions) -> Vec<Row> {
    let rows = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| Row {
            line: index + 1,
            fields: line
                .split(DELIMITER)
                .map(|field| field.trim_start().to_string())
                .collect(),
        });

    if options.skips_first_row() {
        rows.skip(1).collect()
    } else {
        rows.collect()
    }
}

/// Read an annotation file into raw rows. See [`split_rows`].
///
/// # Errors
///
/// Returns [`VidframesError::IoError`] if the file cannot be read.
pub fn read_rows<P: AsRef<Path>>(
    path: P,
    options: &AnnotationOptions,
) -> Result<Vec<Row>, VidframesError> {
    let path = path.as_ref();
    log::debug!("Reading annotations from {}", path.display());
    let text = fs::read_to_string(path)?;
    Ok(split_rows(&text, options))
}

/// Turn raw rows into labelled time spans, in file order.
///
/// Fields beyond the third are ignored.
///
/// # Errors
///
/// Returns [`VidframesError::MalformedAnnotation`] for a row with fewer than
/// three fields or with a time that is not a number.
pub fn rows_to_entries(rows: &[Row]) -> Result<Vec<AnnotationEntry>, VidframesError> {
    rows.iter().map(row_to_entry).collect()
}

fn row_to_entry(row: &Row) -> Result<AnnotationEntry, VidframesError> {
    let [label, start, end, ..] = row.fields.as_slice() else {
        return Err(VidframesError::MalformedAnnotation {
            line: row.line,
            reason: format!("expected 3 fields, found {}", row.fields.len()),
        });
    };

    let parse_seconds = |field: &str, name: &str| {
        field
            .trim()
            .parse::<f64>()
            .map_err(|_| VidframesError::MalformedAnnotation {
                line: row.line,
                reason: format!("{name} time {field:?} is not a number"),
            })
    };

    Ok(AnnotationEntry {
        label: label.trim().to_string(),
        interval: TimeInterval::new(
            parse_seconds(start.as_str(), "start")?,
            parse_seconds(end.as_str(), "end")?,
        ),
    })
}

/// Parse annotation text held in memory.
///
/// # Errors
///
/// See [`rows_to_entries`].
pub fn parse_annotations(
    text: &str,
    options: &AnnotationOptions,
) -> Result<Vec<AnnotationEntry>, VidframesError> {
    rows_to_entries(&split_rows(text, options))
}

/// Read an annotation file into labelled time spans.
///
/// # Errors
///
/// Returns [`VidframesError::IoError`] if the file cannot be read, or
/// [`VidframesError::MalformedAnnotation`] for an unparsable row.
pub fn read_annotations<P: AsRef<Path>>(
    path: P,
    options: &AnnotationOptions,
) -> Result<Vec<AnnotationEntry>, VidframesError> {
    let entries = rows_to_entries(&read_rows(path, options)?)?;
    log::debug!("Parsed {} annotation entries", entries.len());
    Ok(entries)
}

/// Read a headerless file of labelled spans such as `4R;17.4;25.2`.
///
/// # Errors
///
/// See [`read_annotations`].
pub fn read_site_times<P: AsRef<Path>>(path: P) -> Result<Vec<AnnotationEntry>, VidframesError> {
    read_annotations(path, &AnnotationOptions::new())
}

/// Read a clip trim list: a header row, then `video file;start;end` rows.
///
/// # Errors
///
/// See [`read_annotations`].
pub fn read_clip_trims<P: AsRef<Path>>(path: P) -> Result<Vec<AnnotationEntry>, VidframesError> {
    read_annotations(path, &AnnotationOptions::new().with_header(true))
}
