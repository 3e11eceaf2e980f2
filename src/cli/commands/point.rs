//! Point command: take-off angles at every station for one location

use super::shared::{ProcessingStats, build_pipeline, setup_logging};
use crate::app::models::{AngleResultSet, GridSampling, ScatterPoint};
use crate::app::services::angle_writer::AngleScatterWriter;
use crate::app::services::discovery::{discover_stations, grid_search_root};
use crate::app::services::scatter_cloud::ScatterCloud;
use crate::app::services::station_catalog::{LoadStats, StationCatalog};
use crate::cli::args::PointArgs;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Point command runner
///
/// Prints `name<TAB>azimuth<TAB>dip` for each station to stdout.
pub async fn run_point(
    args: PointArgs,
    cancellation_token: CancellationToken,
) -> Result<ProcessingStats> {
    let start_time = Instant::now();

    setup_logging(&args.options)?;
    debug!("Point arguments: {:?}", args);
    args.validate()?;

    let (results, load_stats) = resolve_point(&args, &cancellation_token).await?;

    let mut stdout = std::io::stdout().lock();
    for sample in &results {
        stdout
            .write_all(AngleScatterWriter::station_lines(sample).as_bytes())
            .map_err(|e| Error::io("Failed to write to stdout", e))?;
    }

    Ok(ProcessingStats {
        stations_loaded: load_stats.stations_loaded,
        stations_dropped: load_stats.stations_dropped(),
        samples_resolved: results.len(),
        processing_time: start_time.elapsed(),
        ..ProcessingStats::default()
    })
}

/// Discover the stations under `--grid-path` and resolve the single point
pub async fn resolve_point(
    args: &PointArgs,
    cancellation_token: &CancellationToken,
) -> Result<(AngleResultSet, LoadStats)> {
    let search_root = grid_search_root(&args.grid_path);
    let entries = discover_stations(&search_root, &args.phase)
        .map_err(|e| Error::discovery(format!("{:#}", e)))?;
    if entries.is_empty() {
        warn!(
            "No {} phase angle grids found under {}",
            args.phase, search_root
        );
    }

    let (catalog, load_stats) =
        StationCatalog::load_entries(entries, Path::new(&search_root)).await;

    let mut config = args.options.to_config(GridSampling::Uniform);
    config.show_progress = false;
    let pipeline = build_pipeline(config)?;

    info!(
        "Resolving angles at ({}, {}, {}) for {} stations",
        args.x,
        args.y,
        args.z,
        catalog.len()
    );

    let cloud = ScatterCloud::from_points(vec![ScatterPoint::new(args.x, args.y, args.z, 1.0)]);
    let results = pipeline
        .resolve_cloud(Arc::new(catalog), cloud.points(), cancellation_token)
        .await?;

    Ok((results, load_stats))
}
