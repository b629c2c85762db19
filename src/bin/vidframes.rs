use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use vidframes::{
    AnnotationOptions, BatchReport, ExtractionConfig, Extractor, FfmpegLogLevel, OperationType,
    ProgressCallback, ProgressInfo, VideoReport, annotation, directory, next_identifier,
    validate_range,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vidframes convert raw_videos --out dataset --every 5\n  vidframes convert raw_videos --out dataset --group-fields 2 --group-separator -\n  vidframes segments raw_videos/case_07.avi --annotations stations.csv --out dataset\n  vidframes trims raw_videos --list trims.csv --out dataset --json\n  vidframes ranges stations.csv --fps 25 --frames 9000\n  vidframes next-id dataset";

#[derive(Debug, Parser)]
#[command(
    name = "vidframes",
    version,
    about = "Turn video recordings into numbered directories of still frames",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar while frames are written.
    #[arg(long)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct OutputOptions {
    /// Dataset root that subject directories are created in.
    #[arg(long)]
    out: PathBuf,

    /// Extract every Nth frame.
    #[arg(long, default_value_t = 1)]
    every: u64,

    /// Output image extension (png, jpg, bmp, tiff).
    #[arg(long, default_value = "png")]
    ext: String,

    /// Subject directory prefix.
    #[arg(long, default_value = "Patient")]
    subject_prefix: String,

    /// Sequence directory prefix.
    #[arg(long, default_value = "Sequence")]
    sequence_prefix: String,

    /// Leave source videos in place instead of moving them to converted_files/.
    #[arg(long)]
    keep_sources: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert every video in a directory.
    #[command(
        about = "Convert a directory of videos",
        after_help = "Examples:\n  vidframes convert raw_videos --out dataset\n  vidframes convert raw_videos --out dataset --group-fields 2 --group-separator -"
    )]
    Convert {
        /// Directory containing the source videos.
        input: PathBuf,

        #[command(flatten)]
        output: OutputOptions,

        /// Accepted video extensions.
        #[arg(long, value_delimiter = ',', default_value = "avi,mpg")]
        video_ext: Vec<String>,

        /// Group videos whose file names share the first N fields into one subject.
        #[arg(long)]
        group_fields: Option<usize>,

        /// Field separator used with --group-fields.
        #[arg(long, default_value_t = '-')]
        group_separator: char,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Cut annotated segments of one video into sequences of a new subject.
    #[command(about = "Convert annotated segments of one video")]
    Segments {
        /// Source video.
        video: PathBuf,

        /// Annotation file with `label;start;end` rows.
        #[arg(long)]
        annotations: PathBuf,

        /// The annotation file starts with a header row.
        #[arg(long)]
        header: bool,

        #[command(flatten)]
        output: OutputOptions,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Convert the videos listed in a clip trim list.
    #[command(about = "Convert videos named in a trim list")]
    Trims {
        /// Directory containing the listed videos.
        input: PathBuf,

        /// Trim list with a header row and `file;start;end` rows.
        #[arg(long)]
        list: PathBuf,

        #[command(flatten)]
        output: OutputOptions,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve annotation spans to frame ranges without writing anything.
    #[command(about = "Dry-run annotation spans against a frame rate")]
    Ranges {
        /// Annotation file with `label;start;end` rows.
        annotations: PathBuf,

        /// Frame rate of the video.
        #[arg(long)]
        fps: f64,

        /// Number of frames in the video.
        #[arg(long)]
        frames: u64,

        /// The annotation file starts with a header row.
        #[arg(long)]
        header: bool,
    },

    /// Print the next free numbered directory name.
    #[command(about = "Show the next free identifier in a directory")]
    NextId {
        /// Parent directory to scan.
        dir: PathBuf,

        /// Directory name prefix.
        #[arg(long, default_value = "Patient")]
        prefix: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        match info.operation {
            OperationType::FrameExport => {
                if let Some(total) = info.total {
                    self.bar.set_length(total);
                }
                self.bar.set_position(info.current);
            }
            OperationType::BatchConversion => {
                let total = info.total.unwrap_or(0);
                self.bar
                    .set_message(format!("video {}/{}", info.current, total));
                if total > 0 && info.current == total {
                    self.bar.finish_with_message("done");
                }
            }
            _ => {}
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global.verbose);

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        vidframes::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

fn build_config(
    global: &GlobalOptions,
    output: &OutputOptions,
) -> Result<ExtractionConfig, Box<dyn std::error::Error>> {
    if output.every == 0 {
        return Err("--every must be greater than 0".into());
    }

    let mut config = ExtractionConfig::new()
        .with_frame_interval(output.every)
        .with_image_extension(&output.ext)
        .with_subject_prefix(&output.subject_prefix)
        .with_sequence_prefix(&output.sequence_prefix)
        .with_relocate_sources(!output.keep_sources);
    config.image_format()?;

    if global.progress {
        config = config.with_progress(Arc::new(BarProgress::new()?));
    }

    Ok(config)
}

/// Grouping key made of the first `fields` separator-delimited parts of the
/// file stem, e.g. `EBUS-20210604` for `EBUS-20210604-092427.avi`.
fn group_key(path: &Path, fields: usize, separator: char) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.split(separator)
        .take(fields.max(1))
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

fn video_report_json(report: &VideoReport) -> Value {
    json!({
        "source": report.source.display().to_string(),
        "subject": report.subject.path.display().to_string(),
        "relocated_to": report.relocated_to.as_ref().map(|path| path.display().to_string()),
        "sequences": report.sequences.iter().map(|sequence| json!({
            "directory": sequence.directory.path.display().to_string(),
            "label": sequence.label,
            "start_frame": sequence.range.start,
            "end_frame": sequence.range.end,
            "frames_written": sequence.frames_written,
        })).collect::<Vec<_>>(),
    })
}

fn print_video_report(report: &VideoReport) {
    for sequence in &report.sequences {
        let label = sequence
            .label
            .as_deref()
            .map(|label| format!(" ({label})"))
            .unwrap_or_default();
        println!(
            "{} {} -> {}{label}: {} frame(s) from {}",
            "saved".green().bold(),
            report.source.display(),
            sequence.directory.path.display(),
            sequence.frames_written,
            sequence.range,
        );
    }
}

fn finish_batch(report: &BatchReport, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if as_json {
        let payload = json!({
            "converted": report.converted.iter().map(video_report_json).collect::<Vec<_>>(),
            "failed": report.failed.iter().map(|failure| json!({
                "source": failure.source.display().to_string(),
                "error": failure.error.to_string(),
            })).collect::<Vec<_>>(),
            "frames_written": report.frames_written(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for converted in &report.converted {
            print_video_report(converted);
        }
        for failure in &report.failed {
            eprintln!(
                "{} skipped {}: {}",
                "warning:".yellow().bold(),
                failure.source.display(),
                failure.error
            );
        }
    }

    if report.is_success() {
        if !as_json {
            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Converted {} video(s), {} frame(s)",
                    report.converted.len(),
                    report.frames_written()
                )
                .green()
            );
        }
        Ok(())
    } else {
        Err(format!(
            "{} of {} video(s) failed; they were left in place",
            report.failed.len(),
            report.failed.len() + report.converted.len()
        )
        .into())
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            video_ext,
            group_fields,
            group_separator,
            json,
        } => {
            let config = build_config(&cli.global, &output)?.with_video_extensions(&video_ext);
            let extractor = Extractor::new(&output.out, config);
            let report = match group_fields {
                Some(fields) => extractor.convert_grouped(&input, |path| {
                    group_key(path, fields, group_separator)
                })?,
                None => extractor.convert_directory(&input)?,
            };
            finish_batch(&report, json)?;
        }
        Commands::Segments {
            video,
            annotations,
            header,
            output,
            json,
        } => {
            let entries = annotation::read_annotations(
                &annotations,
                &AnnotationOptions::new().with_header(header),
            )?;
            if entries.is_empty() {
                return Err(format!("{} contains no annotations", annotations.display()).into());
            }

            let extractor = Extractor::new(&output.out, build_config(&cli.global, &output)?);
            let report = extractor.convert_segments(&video, &entries)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&video_report_json(&report))?);
            } else {
                print_video_report(&report);
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Wrote {} sequence(s) under {}",
                        report.sequences.len(),
                        report.subject.path.display()
                    )
                    .green()
                );
            }
        }
        Commands::Trims {
            input,
            list,
            output,
            json,
        } => {
            let trims = annotation::read_clip_trims(&list)?;
            let extractor = Extractor::new(&output.out, build_config(&cli.global, &output)?);
            let report = extractor.convert_trimmed(&input, &trims)?;
            finish_batch(&report, json)?;
        }
        Commands::Ranges {
            annotations,
            fps,
            frames,
            header,
        } => {
            let entries = annotation::read_annotations(
                &annotations,
                &AnnotationOptions::new().with_header(header),
            )?;
            let mut failures = 0_usize;
            for entry in &entries {
                match validate_range(&entry.interval, fps, frames) {
                    Ok(range) => println!(
                        "{}: {} -> {} ({} frames)",
                        entry.label,
                        entry.interval,
                        range,
                        range.len()
                    ),
                    Err(error) => {
                        failures += 1;
                        eprintln!(
                            "{} {}: {} -> {error}",
                            "invalid:".red().bold(),
                            entry.label,
                            entry.interval
                        );
                    }
                }
            }
            if failures > 0 {
                return Err(format!("{failures} of {} span(s) are invalid", entries.len()).into());
            }
        }
        Commands::NextId { dir, prefix } => {
            let used = directory::scan_identifiers(&dir, &prefix)?;
            let identifier = next_identifier(&used)?;
            println!("{}", directory::numbered_name(&prefix, identifier));
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidframes", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;

    use super::{Cli, Commands, group_key};

    #[test]
    fn group_key_takes_leading_fields() {
        let path = Path::new("raw/EBUS-20210604-092427.avi");
        assert_eq!(group_key(path, 2, '-'), "EBUS-20210604");
        assert_eq!(group_key(path, 1, '-'), "EBUS");
        assert_eq!(group_key(path, 10, '-'), "EBUS-20210604-092427");
    }

    #[test]
    fn group_key_treats_zero_fields_as_one() {
        assert_eq!(group_key(Path::new("a_b.avi"), 0, '_'), "a");
    }

    #[test]
    fn convert_defaults() {
        let cli = Cli::try_parse_from(["vidframes", "convert", "raw", "--out", "dataset"]).unwrap();
        match cli.command {
            Commands::Convert {
                output, video_ext, ..
            } => {
                assert_eq!(output.every, 1);
                assert_eq!(output.ext, "png");
                assert_eq!(output.subject_prefix, "Patient");
                assert!(!output.keep_sources);
                assert_eq!(video_ext, vec!["avi".to_string(), "mpg".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ranges_requires_fps_and_frames() {
        assert!(Cli::try_parse_from(["vidframes", "ranges", "a.csv"]).is_err());
        assert!(
            Cli::try_parse_from(["vidframes", "ranges", "a.csv", "--fps", "25", "--frames", "100"])
                .is_ok()
        );
    }
}
