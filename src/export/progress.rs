//! Progress reporting for export runs
//!
//! Shows a live progress bar while documents are being exported. The index
//! reports a result total with the first page; until then (or when the
//! total is not parseable) the bar runs as a plain spinner with a counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress tracker for export runs
///
/// Safe to update from any worker; disabled entirely in quiet mode.
pub struct ProgressTracker {
    /// Number of documents processed so far
    processed: AtomicU64,
    /// Start time of the run
    start_time: Instant,
    /// Progress bar (None when disabled)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `total` - Total number of documents if already known
    /// * `enable_bar` - Whether to display a progress bar
    pub fn new(total: Option<u64>, enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| {
            let bar = match total {
                Some(n) => ProgressBar::new(n),
                None => ProgressBar::new_spinner(),
            };
            Self::apply_style(&bar, total.is_some());
            bar
        });

        Self {
            processed: AtomicU64::new(0),
            start_time: Instant::now(),
            bar,
        }
    }

    fn apply_style(bar: &ProgressBar, bounded: bool) {
        let template = if bounded {
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}"
        } else {
            "{spinner:.green} {pos} documents {msg}"
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template(template)
            .map(|s| s.progress_chars("#>-"))
        {
            bar.set_style(style);
        }
    }

    /// Seed the total once the index has reported one
    ///
    /// # Arguments
    /// * `total` - Index-reported number of documents
    pub fn set_total(&self, total: u64) {
        if let Some(ref bar) = self.bar {
            bar.set_length(total);
            Self::apply_style(bar, true);
        }
    }

    /// Update progress with the cumulative processed count
    ///
    /// # Arguments
    /// * `count` - Total number of documents processed so far
    pub fn update(&self, count: u64) {
        self.processed.store(count, Ordering::Relaxed);

        if let Some(ref bar) = self.bar {
            bar.set_position(count);

            let elapsed = self.start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let speed = count as f64 / elapsed;
                bar.set_message(format!("({speed:.0} docs/sec)"));
            }
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_with_total() {
        let tracker = ProgressTracker::new(Some(100), false);
        tracker.update(50);
        tracker.finish();
    }

    #[test]
    fn test_tracker_total_seeded_later() {
        let tracker = ProgressTracker::new(None, false);
        tracker.update(5);
        tracker.set_total(40);
        tracker.update(10);
        tracker.finish();
    }
}
