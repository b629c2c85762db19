//! Frame range validation tests.

use vidframes::{FrameRange, TimeInterval, VidframesError, range::seconds_to_frame, validate_range};

// ── seconds_to_frame ─────────────────────────────────────────────

#[test]
fn rounds_to_nearest_frame() {
    assert_eq!(seconds_to_frame(17.4, 25.0), 435);
    assert_eq!(seconds_to_frame(25.2, 25.0), 630);
    assert_eq!(seconds_to_frame(1.0, 29.97), 30);
}

#[test]
fn rounds_half_away_from_zero() {
    // 0.1 s at 25 fps is exactly 2.5 frames.
    assert_eq!(seconds_to_frame(0.1, 25.0), 3);
    assert_eq!(seconds_to_frame(-0.1, 25.0), -3);
}

// ── validate_range ───────────────────────────────────────────────

#[test]
fn annotated_span_resolves() {
    let range = validate_range(&TimeInterval::new(17.4, 25.2), 25.0, 10_000).unwrap();
    assert_eq!(range, FrameRange::new(435, 630));
    assert_eq!(range.len(), 195);
}

#[test]
fn whole_video_is_always_valid() {
    for (fps, total) in [(25.0, 250_u64), (30.0, 9_000), (29.97, 1_798), (24.0, 1), (60.0, 12_345)] {
        let interval = TimeInterval::whole(total as f64 / fps);
        let range = validate_range(&interval, fps, total)
            .unwrap_or_else(|error| panic!("{fps} fps, {total} frames: {error}"));
        assert_eq!(range, FrameRange::new(0, total));
    }
}

#[test]
fn end_equal_to_total_is_allowed() {
    let range = validate_range(&TimeInterval::new(9.0, 10.0), 25.0, 250).unwrap();
    assert_eq!(range, FrameRange::new(225, 250));
}

#[test]
fn end_past_total_is_out_of_bounds() {
    let error = validate_range(&TimeInterval::new(9.0, 11.0), 25.0, 250).unwrap_err();
    assert!(matches!(
        error,
        VidframesError::FrameRangeOutOfBounds {
            start_frame: 225,
            end_frame: 275,
            total_frames: 250,
        }
    ));
    assert!(error.is_range_violation());
}

#[test]
fn start_at_total_is_out_of_bounds() {
    let error = validate_range(&TimeInterval::new(10.0, 11.0), 25.0, 250).unwrap_err();
    assert!(matches!(error, VidframesError::FrameRangeOutOfBounds { .. }));
}

#[test]
fn negative_start_is_out_of_bounds() {
    let error = validate_range(&TimeInterval::new(-1.0, 2.0), 25.0, 250).unwrap_err();
    assert!(matches!(
        error,
        VidframesError::FrameRangeOutOfBounds { start_frame: -25, .. }
    ));
}

#[test]
fn zero_end_is_out_of_bounds() {
    let error = validate_range(&TimeInterval::new(0.0, 0.0), 25.0, 250).unwrap_err();
    assert!(matches!(error, VidframesError::FrameRangeOutOfBounds { end_frame: 0, .. }));
}

#[test]
fn inverted_span_is_empty() {
    let error = validate_range(&TimeInterval::new(5.0, 4.0), 25.0, 250).unwrap_err();
    assert!(matches!(
        error,
        VidframesError::EmptyFrameRange {
            start_frame: 125,
            end_frame: 100,
        }
    ));
    assert!(error.is_range_violation());
}

#[test]
fn ordering_and_bounds_violations_are_distinct() {
    let ordering = validate_range(&TimeInterval::new(10.0, 5.0), 30.0, 1_000).unwrap_err();
    assert!(matches!(ordering, VidframesError::EmptyFrameRange { .. }));

    let bounds = validate_range(&TimeInterval::new(0.0, 1_000.0), 30.0, 100).unwrap_err();
    assert!(matches!(bounds, VidframesError::FrameRangeOutOfBounds { .. }));
}

#[test]
fn span_rounding_to_one_frame_is_empty() {
    // Both ends round to frame 25.
    let error = validate_range(&TimeInterval::new(1.0, 1.01), 25.0, 250).unwrap_err();
    assert!(matches!(error, VidframesError::EmptyFrameRange { .. }));
}

#[test]
fn non_finite_timestamps_are_rejected() {
    let error = validate_range(&TimeInterval::new(f64::NAN, 2.0), 25.0, 250).unwrap_err();
    assert!(matches!(error, VidframesError::InvalidTimestamp(_)));

    let error = validate_range(&TimeInterval::new(0.0, f64::INFINITY), 25.0, 250).unwrap_err();
    assert!(matches!(error, VidframesError::InvalidTimestamp(_)));
}

#[test]
fn invalid_frame_rates_are_rejected() {
    for fps in [0.0, -25.0, f64::NAN, f64::INFINITY] {
        let error = validate_range(&TimeInterval::new(0.0, 1.0), fps, 250).unwrap_err();
        assert!(matches!(error, VidframesError::InvalidFrameRate(_)), "{fps}");
    }
}

#[test]
fn empty_video_rejects_everything() {
    let error = validate_range(&TimeInterval::whole(0.0), 25.0, 0).unwrap_err();
    assert!(error.is_range_violation());
}

// ── FrameRange ───────────────────────────────────────────────────

#[test]
fn stride_selection() {
    let range = FrameRange::new(10, 20);
    assert_eq!(range.selected_count(1), 10);
    assert_eq!(range.selected_count(3), 4);
    assert_eq!(range.selected_count(0), 10);
    assert!(range.selects(10, 3));
    assert!(range.selects(19, 3));
    assert!(!range.selects(11, 3));
    assert!(!range.selects(20, 1));
    assert!(!range.selects(9, 1));
}

#[test]
fn displays_half_open() {
    assert_eq!(FrameRange::new(435, 630).to_string(), "[435, 630)");
    assert!(FrameRange::new(3, 3).is_empty());
}
