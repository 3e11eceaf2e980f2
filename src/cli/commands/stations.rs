//! Stations command: report the catalog built from a station file
//!
//! Shows which stations load, how their grids are classified, and which
//! were dropped for missing or malformed headers.

use super::shared::{ProcessingStats, setup_logging};
use crate::app::models::GridDimension;
use crate::app::services::station_catalog::{LoadStats, StationCatalog};
use crate::cli::args::{OutputFormat, StationsArgs};
use crate::{Error, Result};
use std::time::Instant;
use tracing::{debug, info};

/// Stations command runner
pub async fn run_stations(args: StationsArgs) -> Result<ProcessingStats> {
    let start_time = Instant::now();

    setup_logging(&args.options)?;
    debug!("Stations arguments: {:?}", args);
    args.validate()?;

    let (catalog, load_stats) = StationCatalog::load(&args.station_file).await?;

    let report = match args.output_format {
        OutputFormat::Human => human_report(&catalog, &load_stats),
        OutputFormat::Json => json_report(&catalog, &load_stats)?,
        OutputFormat::Csv => csv_report(&catalog),
    };

    let mut stats = ProcessingStats {
        stations_loaded: load_stats.stations_loaded,
        stations_dropped: load_stats.stations_dropped(),
        ..ProcessingStats::default()
    };

    match &args.output_file {
        Some(path) => {
            std::fs::write(path, &report).map_err(|e| {
                Error::output_write(
                    path.display().to_string(),
                    format!("Failed to write station report: {}", e),
                )
            })?;
            info!("Station report written to: {}", path.display());
            stats
                .output_sizes
                .push((path.display().to_string(), report.len() as u64));
        }
        None => print!("{}", report),
    }

    stats.processing_time = start_time.elapsed();
    Ok(stats)
}

/// Human-readable station report
pub fn human_report(catalog: &StationCatalog, load_stats: &LoadStats) -> String {
    let mut output = format!(
        "Station Catalog Report\n\
         ======================\n\
         Station file: {}\n\
         Stations: {} ({} 2D, {} 3D)\n\
         Entries parsed: {}, dropped: {}\n\
         Load time: {:.2}s\n\
         \n",
        catalog.source_path().display(),
        catalog.len(),
        catalog.count_by_dimension(GridDimension::TwoD),
        catalog.count_by_dimension(GridDimension::ThreeD),
        load_stats.entries_parsed,
        load_stats.stations_dropped(),
        load_stats.load_duration.as_secs_f64()
    );

    if !catalog.is_empty() {
        output.push_str("Name         | Grid | Source x   | Source y   | Source z   | Grid root\n");
        output.push_str("-------------|------|------------|------------|------------|----------\n");
        for station in catalog {
            let source = station.source();
            output.push_str(&format!(
                "{:12} | {:4} | {:10.3} | {:10.3} | {:10.3} | {}\n",
                station.name(),
                station.dimension().label(),
                source.x,
                source.y,
                source.z,
                station.grid_root()
            ));
        }
        output.push('\n');
    }

    if !load_stats.missing_headers.is_empty() {
        output.push_str("Missing grid headers:\n");
        for path in &load_stats.missing_headers {
            output.push_str(&format!("   • {}\n", path.display()));
        }
        output.push('\n');
    }

    if !load_stats.malformed_headers.is_empty() {
        output.push_str("Malformed grid headers:\n");
        for message in &load_stats.malformed_headers {
            output.push_str(&format!("   • {}\n", message));
        }
        output.push('\n');
    }

    output
}

/// JSON station report
pub fn json_report(catalog: &StationCatalog, load_stats: &LoadStats) -> Result<String> {
    use serde_json::json;

    let stations: Vec<_> = catalog
        .iter()
        .map(|station| {
            json!({
                "name": station.name(),
                "grid_root": station.grid_root(),
                "dimension": station.dimension().label(),
                "label": station.label(),
                "source": {
                    "x": station.source().x,
                    "y": station.source().y,
                    "z": station.source().z
                }
            })
        })
        .collect();

    let report = json!({
        "metadata": {
            "station_file": catalog.source_path(),
            "entries_parsed": load_stats.entries_parsed,
            "stations_loaded": load_stats.stations_loaded,
            "stations_2d": load_stats.stations_2d,
            "stations_3d": load_stats.stations_3d,
            "stations_dropped": load_stats.stations_dropped(),
            "load_duration_seconds": load_stats.load_duration.as_secs_f64()
        },
        "missing_headers": load_stats.missing_headers,
        "malformed_headers": load_stats.malformed_headers,
        "stations": stations
    });

    let mut output = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::configuration(format!("Failed to serialize station report: {}", e)))?;
    output.push('\n');
    Ok(output)
}

/// CSV station listing
pub fn csv_report(catalog: &StationCatalog) -> String {
    let mut output = String::from("name,dimension,source_x,source_y,source_z,label,grid_root\n");
    for station in catalog {
        let source = station.source();
        output.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            csv_field(station.name()),
            station.dimension().label(),
            source.x,
            source.y,
            source.z,
            csv_field(station.label()),
            csv_field(station.grid_root())
        ));
    }
    output
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
