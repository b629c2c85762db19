//! Benchmarks for identifier allocation, range validation, annotation parsing
//! and frame extraction.
//!
//! Run with: cargo bench
//!
//! The extraction benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{fs, hint::black_box, path::Path};

use criterion::Criterion;
use ffmpeg_next::util::log::Level as LogLevel;
use vidframes::{
    AnnotationOptions, ExtractionConfig, Extractor, TimeInterval, annotation::parse_annotations,
    next_identifier, validate_range,
};

const SAMPLE_AVI: &str = "tests/fixtures/sample_video.avi";

fn benchmark_next_identifier(criterion: &mut Criterion) {
    let dense: Vec<i64> = (1..=1_000).collect();
    let mut gapped: Vec<i64> = (1..=1_000).rev().collect();
    gapped.retain(|&identifier| identifier != 750);

    let mut group = criterion.benchmark_group("next_identifier");
    group.bench_function("1000 contiguous", |bencher| {
        bencher.iter(|| next_identifier(black_box(&dense)).unwrap());
    });
    group.bench_function("1000 reversed with gap", |bencher| {
        bencher.iter(|| next_identifier(black_box(&gapped)).unwrap());
    });
    group.finish();
}

fn benchmark_validate_range(criterion: &mut Criterion) {
    let interval = TimeInterval::new(17.4, 25.2);
    criterion.bench_function("validate_range", |bencher| {
        bencher.iter(|| validate_range(black_box(&interval), black_box(25.0), 10_000).unwrap());
    });
}

fn benchmark_parse_annotations(criterion: &mut Criterion) {
    let text: String = (0..500)
        .map(|index| format!("{index}R;{}.4;{}.2\n", index * 10, index * 10 + 8))
        .collect();
    let options = AnnotationOptions::new();

    criterion.bench_function("parse 500 annotation rows", |bencher| {
        bencher.iter(|| parse_annotations(black_box(&text), &options).unwrap());
    });
}

fn benchmark_segment_extraction(criterion: &mut Criterion) {
    ffmpeg_next::util::log::set_level(LogLevel::Error);

    if !Path::new(SAMPLE_AVI).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("segment extraction");
    group.sample_size(10);

    for stride in [1_u64, 5] {
        group.bench_function(format!("1 s every {stride}"), |bencher| {
            bencher.iter(|| {
                let workspace = tempfile::tempdir().unwrap();
                let input = workspace.path().join("case.avi");
                fs::copy(SAMPLE_AVI, &input).unwrap();

                let config = ExtractionConfig::new()
                    .with_frame_interval(stride)
                    .with_relocate_sources(false);
                let extractor = Extractor::new(workspace.path().join("dataset"), config);
                extractor
                    .convert_video(&input, Some(TimeInterval::new(1.0, 2.0)))
                    .unwrap();
            });
        });
    }

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_next_identifier,
    benchmark_validate_range,
    benchmark_parse_annotations,
    benchmark_segment_extraction,
);
criterion::criterion_main!(benches);
