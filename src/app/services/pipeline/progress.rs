//! Progress reporting for angle resolution
//!
//! Logs a line every `interval` samples and optionally drives an indicatif
//! progress bar on stderr.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Progress reporter for scatter sample resolution
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    total_samples: usize,
    interval: usize,
    resolved: usize,
}

impl ProgressReporter {
    /// Create a reporter that logs every `interval` samples
    pub fn new(total_samples: usize, interval: usize) -> Self {
        Self {
            progress_bar: None,
            total_samples,
            interval: interval.max(1),
            resolved: 0,
        }
    }

    /// Show a progress bar for the run
    pub fn enable_progress_bar(&mut self) {
        let pb = ProgressBar::new(self.total_samples as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} samples ({percent}%) | {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message("Resolving take-off angles");

        debug!("Progress bar initialized for {} samples", self.total_samples);
        self.progress_bar = Some(pb);
    }

    /// Record `count` newly resolved samples, in input order
    pub fn record(&mut self, count: usize) {
        for index in self.resolved..self.resolved + count {
            if index % self.interval == 0 {
                let message = format!("Retrieved sample {} of {}", index, self.total_samples);
                self.suspend(|| info!("{}", message));
            }
        }
        self.resolved += count;

        if let Some(ref pb) = self.progress_bar {
            pb.inc(count as u64);
        }
    }

    /// Samples recorded so far
    pub fn resolved(&self) -> usize {
        self.resolved
    }

    pub fn is_enabled(&self) -> bool {
        self.progress_bar.is_some()
    }

    /// Calculate completion percentage
    pub fn completion_percentage(&self) -> f64 {
        if self.total_samples == 0 {
            100.0
        } else {
            (self.resolved as f64 / self.total_samples as f64) * 100.0
        }
    }

    /// Finish with a completion message
    pub fn finish(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Finish with an error message
    pub fn finish_with_error(&self, error_message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.abandon_with_message(format!("Failed: {}", error_message));
            debug!("Progress reporting finished with error: {}", error_message);
        }
    }

    /// Run `f` with the progress bar hidden so log lines stay readable
    fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        match self.progress_bar {
            Some(ref pb) => pb.suspend(f),
            None => f(),
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}
