//! Annotation reader tests.

use std::fs;

use tempfile::tempdir;
use vidframes::{
    AnnotationOptions, TimeInterval, VidframesError,
    annotation::{parse_annotations, read_clip_trims, read_site_times, split_rows},
};

// ── Row splitting ────────────────────────────────────────────────

#[test]
fn splits_on_semicolons_and_trims_leading_whitespace() {
    let rows = split_rows("4R; 17.4;  25.2\n", &AnnotationOptions::new());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].line, 1);
    assert_eq!(rows[0].fields, vec!["4R", "17.4", "25.2"]);
}

#[test]
fn blank_lines_are_skipped_but_counted() {
    let rows = split_rows("a;1;2\n\n   \nb;3;4\n", &AnnotationOptions::new());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].line, 4);
}

#[test]
fn header_is_dropped_when_declared() {
    let text = "file;start;end\nclip.avi;1;2\n";
    let rows = split_rows(text, &AnnotationOptions::new().with_header(true));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fields[0], "clip.avi");
}

#[test]
fn header_is_kept_when_requested() {
    let text = "file;start;end\nclip.avi;1;2\n";
    let options = AnnotationOptions::new().with_header(true).include_header(true);
    let rows = split_rows(text, &options);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].fields, vec!["file", "start", "end"]);
}

#[test]
fn include_header_without_header_changes_nothing() {
    let text = "a;1;2\nb;3;4\n";
    let rows = split_rows(text, &AnnotationOptions::new().include_header(true));
    assert_eq!(rows.len(), 2);
}

#[test]
fn windows_line_endings_are_accepted() {
    let entries = parse_annotations("4R;17.4;25.2\r\n4L;34.1;39.5\r\n", &AnnotationOptions::new())
        .unwrap();
    assert_eq!(entries[1].interval, TimeInterval::new(34.1, 39.5));
}

// ── Entries ──────────────────────────────────────────────────────

#[test]
fn parses_labelled_spans_in_file_order() {
    let text = "4R;17.4;25.2\n4L;34.1;39.5\n7L;126.3;141.8\n";
    let entries = parse_annotations(text, &AnnotationOptions::new()).unwrap();
    let labels: Vec<_> = entries.iter().map(|entry| entry.label.as_str()).collect();
    assert_eq!(labels, vec!["4R", "4L", "7L"]);
    assert_eq!(entries[0].interval.start(), 17.4);
    assert_eq!(entries[2].interval.end(), 141.8);
}

#[test]
fn extra_fields_are_ignored() {
    let entries = parse_annotations("4R;1;2;comment\n", &AnnotationOptions::new()).unwrap();
    assert_eq!(entries[0].interval, TimeInterval::new(1.0, 2.0));
}

#[test]
fn short_row_is_malformed() {
    let error = parse_annotations("4R;1;2\n4L;3\n", &AnnotationOptions::new()).unwrap_err();
    match error {
        VidframesError::MalformedAnnotation { line, reason } => {
            assert_eq!(line, 2);
            assert!(reason.contains("found 2"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_numeric_time_is_malformed() {
    let error = parse_annotations("4R;abc;2\n", &AnnotationOptions::new()).unwrap_err();
    match error {
        VidframesError::MalformedAnnotation { line, reason } => {
            assert_eq!(line, 1);
            assert!(reason.contains("start"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unskipped_header_is_malformed() {
    let error = parse_annotations("site;start;end\n4R;1;2\n", &AnnotationOptions::new())
        .unwrap_err();
    assert!(matches!(error, VidframesError::MalformedAnnotation { line: 1, .. }));
}

#[test]
fn empty_text_has_no_entries() {
    assert!(parse_annotations("", &AnnotationOptions::new()).unwrap().is_empty());
}

// ── Files ────────────────────────────────────────────────────────

#[test]
fn reads_site_times_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sites.csv");
    fs::write(&path, "4R;17.4;25.2\n10R;40;45\n").unwrap();

    let entries = read_site_times(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].label, "10R");
    assert_eq!(entries[1].interval, TimeInterval::new(40.0, 45.0));
}

#[test]
fn reads_clip_trim_list_with_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trims.csv");
    fs::write(&path, "filename;start;end\ncase_01.avi; 2.5; 8\ncase_02.avi;0;4\n").unwrap();

    let trims = read_clip_trims(&path).unwrap();
    assert_eq!(trims.len(), 2);
    assert_eq!(trims[0].label, "case_01.avi");
    assert_eq!(trims[0].interval, TimeInterval::new(2.5, 8.0));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let error = read_site_times(dir.path().join("missing.csv")).unwrap_err();
    assert!(matches!(error, VidframesError::IoError(_)));
}
