//! Shared components for CLI commands
//!
//! Logging setup, run statistics and the human-readable run report used by
//! every command.

use crate::app::services::grid_query::NllocGridQuery;
use crate::app::services::pipeline::{Pipeline, PipelineStats};
use crate::cli::args::RunOptions;
use crate::config::AngleConfig;
use crate::constants::LOG_ENV_VAR;
use crate::Result;
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Processing statistics for reporting across all commands
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    /// Scatter files converted successfully
    pub files_converted: usize,
    /// Scatter files that failed
    pub files_failed: usize,
    /// Stations in the catalog
    pub stations_loaded: usize,
    /// Stations dropped for missing or malformed grid headers
    pub stations_dropped: usize,
    /// Scatter samples resolved
    pub samples_resolved: usize,
    /// Total processing time
    pub processing_time: Duration,
    /// Output files and their sizes in bytes
    pub output_sizes: Vec<(String, u64)>,
}

impl ProcessingStats {
    /// Fold one pipeline run into the totals
    pub fn record_run(&mut self, run: &PipelineStats) {
        self.files_converted += 1;
        self.stations_loaded = self.stations_loaded.max(run.stations);
        self.samples_resolved += run.samples_resolved;
        self.output_sizes.push((
            run.output_path.display().to_string(),
            run.bytes_written,
        ));
    }

    /// Calculate total output size in bytes
    pub fn total_output_size(&self) -> u64 {
        self.output_sizes.iter().map(|(_, size)| size).sum()
    }

    /// Format output size in human-readable format
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// Set up structured logging on stderr
///
/// `SCATANGLE_LOG` (or `RUST_LOG`) overrides the level from the verbosity
/// flags. Safe to call more than once; later calls are ignored.
pub fn setup_logging(options: &RunOptions) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = options.get_log_level();

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("scatangle={}", log_level)));

    let result = if options.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
    Ok(())
}

/// Build a pipeline over the NonLinLoc grids on disk
pub fn build_pipeline(config: AngleConfig) -> Result<Pipeline<NllocGridQuery>> {
    let grid_query = Arc::new(NllocGridQuery::new(config.geometry_mode, config.byte_order));
    Pipeline::new(config, grid_query)
}

/// Print the end-of-run summary to stderr
pub fn print_summary(title: &str, stats: &ProcessingStats) {
    eprintln!();
    eprintln!("{}", title.bright_green().bold());
    eprintln!(
        "  {} {}",
        "Stations:".bright_cyan(),
        if stats.stations_dropped > 0 {
            format!(
                "{} ({} dropped)",
                stats.stations_loaded, stats.stations_dropped
            )
        } else {
            stats.stations_loaded.to_string()
        }
    );
    eprintln!(
        "  {} {}",
        "Samples:".bright_cyan(),
        stats.samples_resolved
    );
    eprintln!(
        "  {} {}",
        "Files converted:".bright_cyan(),
        stats.files_converted
    );
    if stats.files_failed > 0 {
        eprintln!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed
        );
    }
    for (path, size) in &stats.output_sizes {
        eprintln!(
            "  {} {} ({})",
            "Output:".bright_cyan(),
            path,
            ProcessingStats::format_size(*size)
        );
    }
    eprintln!(
        "  {} {:.2?}",
        "Elapsed:".bright_cyan(),
        stats.processing_time
    );
}
