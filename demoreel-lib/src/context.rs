//! Explicit rendering context and progress reporting.
//!
//! Nothing in the engine reads global audio state. Everything a render needs
//! besides its request (working clock, output layout, progress sink and
//! cancellation flag) travels in a [`RenderContext`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::constants::{OUTPUT_CHANNELS, SAMPLE_RATE};
use crate::error::ReelError;

/// Callback receiving an integer completion percentage.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Phase boundaries at which progress is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    DecodeStart,
    /// `completed` of `total` sources have finished decoding.
    DecodeProgress { completed: usize, total: usize },
    DecodeComplete,
    ScheduleComplete,
    RenderComplete,
    EncodeComplete,
}

impl Milestone {
    /// Percentage associated with the milestone. Not evenly spaced: mixing
    /// dominates the cost of a render.
    pub fn percent(&self) -> u8 {
        match *self {
            Milestone::DecodeStart => 2,
            Milestone::DecodeProgress { completed, total } => {
                if total == 0 {
                    50
                } else {
                    let done = completed.min(total);
                    (2 + 48 * done / total) as u8
                }
            }
            Milestone::DecodeComplete => 55,
            Milestone::ScheduleComplete => 60,
            Milestone::RenderComplete => 90,
            Milestone::EncodeComplete => 100,
        }
    }
}

/// Per-invocation settings that are not part of the request itself.
#[derive(Clone)]
pub struct RenderContext {
    sample_rate: u32,
    channels: usize,
    progress: Option<ProgressCallback>,
    abort: Arc<AtomicBool>,
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("progress", &self.progress.is_some())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    /// Context running at the engine's working rate with stereo output.
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: OUTPUT_CHANNELS,
            progress: None,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Attach a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Share an existing cancellation flag.
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Flag that cancels the render when set.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    pub fn cancel(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Phase-boundary cancellation check.
    pub(crate) fn ensure_active(&self) -> Result<(), ReelError> {
        if self.is_cancelled() {
            Err(ReelError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn progress_tracker(&self) -> ProgressTracker<'_> {
        ProgressTracker {
            callback: self.progress.as_ref(),
            last_percent: 0,
        }
    }
}

/// Progress state owned by a single render invocation.
///
/// Reported percentages never decrease.
pub(crate) struct ProgressTracker<'a> {
    callback: Option<&'a ProgressCallback>,
    last_percent: u8,
}

impl ProgressTracker<'_> {
    pub(crate) fn report(&mut self, milestone: Milestone) {
        let percent = milestone.percent().max(self.last_percent);
        self.last_percent = percent;
        if let Some(callback) = self.callback {
            (**callback)(percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn milestones_are_ordered() {
        let sequence = [
            Milestone::DecodeStart,
            Milestone::DecodeProgress {
                completed: 1,
                total: 3,
            },
            Milestone::DecodeProgress {
                completed: 3,
                total: 3,
            },
            Milestone::DecodeComplete,
            Milestone::ScheduleComplete,
            Milestone::RenderComplete,
            Milestone::EncodeComplete,
        ];
        let percents: Vec<u8> = sequence.iter().map(Milestone::percent).collect();
        assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    #[test]
    fn tracker_never_reports_a_lower_percent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let context = RenderContext::new().with_progress(move |p| sink.lock().unwrap().push(p));

        let mut tracker = context.progress_tracker();
        tracker.report(Milestone::ScheduleComplete);
        tracker.report(Milestone::DecodeStart);
        assert_eq!(*seen.lock().unwrap(), vec![60, 60]);
    }

    #[test]
    fn cancel_is_observed() {
        let context = RenderContext::new();
        assert!(context.ensure_active().is_ok());
        context.abort_handle().store(true, Ordering::SeqCst);
        assert!(matches!(context.ensure_active(), Err(ReelError::Cancelled)));
    }
}
