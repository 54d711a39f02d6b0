//! Stage progress reporting.
//!
//! A [`ProgressCallback`] attached to
//! [`PrepareOptions`](crate::PrepareOptions) is told when each pipeline
//! [`Stage`] begins.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lastframe::{PrepareOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{}/{}] {}", info.current, info.total, info.stage);
//!     }
//! }
//!
//! let options = PrepareOptions::new("input_clip.mp4").with_progress(Arc::new(PrintProgress));
//! lastframe::prepare(&options)?;
//! # Ok::<(), lastframe::PrepareError>(())
//! ```

use std::time::{Duration, Instant};

use crate::error::Stage;

/// Number of stages reported during a full [`prepare`](crate::prepare) run.
pub const PREPARE_STAGE_COUNT: u64 = 6;

/// A snapshot delivered when a stage begins.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The stage that is starting.
    pub stage: Stage,
    /// One-based position of the stage in the run.
    pub current: u64,
    /// Number of stages the run reports.
    pub total: u64,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
}

/// Receives stage notifications during a run.
///
/// Callbacks observe but cannot halt the pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called as each stage begins.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Numbers stages and forwards them to a callback.
pub(crate) struct ProgressTracker<'a> {
    callback: &'a dyn ProgressCallback,
    total: u64,
    current: u64,
    started: Instant,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(callback: &'a dyn ProgressCallback, total: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            started: Instant::now(),
        }
    }

    pub(crate) fn begin(&mut self, stage: Stage) {
        self.current += 1;
        log::debug!("Stage {}/{}: {stage}", self.current, self.total);
        self.callback.on_progress(&ProgressInfo {
            stage,
            current: self.current,
            total: self.total,
            elapsed: self.started.elapsed(),
        });
    }
}
