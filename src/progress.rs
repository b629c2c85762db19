//! Progress reporting.
//!
//! Long conversions report through a [`ProgressCallback`]. The callback
//! receives a [`ProgressInfo`] snapshot every
//! [`batch_size`](crate::ExtractionConfig::with_batch_size) items.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidframes::{ExtractionConfig, Extractor, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let config = ExtractionConfig::new().with_progress(Arc::new(PrintProgress));
//! let extractor = Extractor::new("dataset", config);
//! let report = extractor.convert_directory("raw_videos")?;
//! # Ok::<(), vidframes::VidframesError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The kind of work being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Writing the frames of one sequence.
    FrameExport,
    /// Converting the videos of an input directory.
    BatchConversion,
}

/// A snapshot of progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Items (frames or videos) completed so far.
    pub current: u64,
    /// Total items expected, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on throughput so far.
    pub estimated_remaining: Option<Duration>,
    /// Source frame number just written, for frame exports.
    pub current_frame: Option<u64>,
}

/// Receives progress updates.
///
/// Callbacks observe but cannot stop an operation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during an operation.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one operation and fires the callback every
/// `batch_size` items.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed item.
    pub(crate) fn advance(&mut self, frame_number: Option<u64>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(frame_number);
            self.items_since_last_report = 0;
        }
    }

    /// Emit a final report unless the last item was already reported.
    pub(crate) fn finish(&mut self) {
        if self.items_since_last_report > 0 || self.current == 0 {
            self.report(None);
            self.items_since_last_report = 0;
        }
    }

    fn report(&self, frame_number: Option<u64>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|total| {
                let remaining = total.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_number,
        });
    }
}
