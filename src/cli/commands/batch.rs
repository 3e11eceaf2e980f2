//! Batch command: discover stations and convert every pending scatter file
//!
//! A failing scatter file is logged and counted; the remaining files are
//! still converted. The command fails at the end if any file failed.

use super::shared::{ProcessingStats, build_pipeline, print_summary, setup_logging};
use crate::app::services::discovery::{
    BatchControl, discover_stations, find_unconverted_scatter_files, station_file_path,
    write_station_file,
};
use crate::cli::args::BatchArgs;
use crate::{Error, Result};
use colored::*;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Batch command runner
pub async fn run_batch(
    args: BatchArgs,
    cancellation_token: CancellationToken,
) -> Result<ProcessingStats> {
    let start_time = Instant::now();

    setup_logging(&args.options)?;
    debug!("Batch arguments: {:?}", args);
    args.validate()?;

    let control = BatchControl::load(&args.control_file).await?;
    let grid_sampling = control.resolve_grid_sampling(args.grid);
    info!(
        "Batch run: grids {} ({} phase), scatter {}, {:?} sampling",
        control.grid_root, control.phase, control.scatter_root, grid_sampling
    );

    let entries = discover_stations(&control.grid_root, &control.phase)
        .map_err(|e| Error::discovery(format!("{:#}", e)))?;
    if entries.is_empty() {
        warn!(
            "No {} phase angle grids found under {}",
            control.phase, control.grid_root
        );
    }

    let station_file = station_file_path(&control.grid_root);
    write_station_file(&station_file, &entries)
        .await
        .map_err(|e| Error::discovery(format!("{:#}", e)))?;

    let scatter_files = find_unconverted_scatter_files(&control.scatter_root)
        .map_err(|e| Error::discovery(format!("{:#}", e)))?;

    let pipeline = build_pipeline(args.options.to_config(grid_sampling))?;
    let (catalog, load_stats) = pipeline.load_catalog(&station_file).await?;

    let mut stats = ProcessingStats {
        stations_loaded: catalog.len(),
        stations_dropped: load_stats.stations_dropped(),
        ..ProcessingStats::default()
    };

    if !args.options.quiet {
        eprintln!(
            "{} {} scatter files with {} stations",
            "Converting".bright_green().bold(),
            scatter_files.len(),
            catalog.len()
        );
    }

    for scatter_file in &scatter_files {
        if cancellation_token.is_cancelled() {
            return Err(Error::processing_interrupted(format!(
                "Batch cancelled after {} of {} files",
                stats.files_converted + stats.files_failed,
                scatter_files.len()
            )));
        }

        match pipeline
            .run_with_catalog(catalog.clone(), scatter_file, &cancellation_token)
            .await
        {
            Ok(run) => stats.record_run(&run),
            Err(e @ Error::ProcessingInterrupted { .. }) => return Err(e),
            Err(e) => {
                error!(
                    "Failed to convert {} during {}: {}",
                    scatter_file.display(),
                    e.stage(),
                    e
                );
                stats.files_failed += 1;
            }
        }
    }

    stats.processing_time = start_time.elapsed();

    if !args.options.quiet {
        print_summary("Batch complete", &stats);
    }

    if stats.files_failed > 0 {
        return Err(Error::batch_incomplete(
            stats.files_failed,
            scatter_files.len(),
        ));
    }

    Ok(stats)
}
