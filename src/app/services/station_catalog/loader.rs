//! Station catalog loading
//!
//! Reads the station definition file, opens the grid header of every entry and
//! classifies each station's grid. Stations whose header is missing or
//! unreadable are dropped with a warning; only an unreadable definition file
//! fails the load.

use super::StationCatalog;
use super::metadata::LoadStats;
use super::parser::{StationEntry, parse_grid_header, parse_station_file};
use crate::app::models::{GridDimension, Station};
use crate::{Error, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

impl StationCatalog {
    /// Load a station catalog from a station definition file
    ///
    /// # Arguments
    /// * `station_file` - Path to a file of `NAME:GRIDROOT;` lines
    ///
    /// # Returns
    /// * `Result<(StationCatalog, LoadStats)>` - Catalog in file order and loading statistics
    ///
    /// # Errors
    /// * Returns `Error::StationFile` if the definition file cannot be read
    pub async fn load(station_file: &Path) -> Result<(Self, LoadStats)> {
        info!("Loading station catalog from {}", station_file.display());

        let content = tokio::fs::read_to_string(station_file).await.map_err(|e| {
            Error::station_file(
                station_file.display().to_string(),
                format!("Cannot read station file: {}", e),
            )
        })?;

        let (entries, lines_skipped) = parse_station_file(&content);
        if lines_skipped > 0 {
            debug!(
                "Skipped {} station lines without a name or ':' separator",
                lines_skipped
            );
        }

        let (catalog, mut stats) = Self::load_entries(entries, station_file).await;
        stats.lines_skipped = lines_skipped;

        Ok((catalog, stats))
    }

    /// Build a catalog from parsed entries, reading each grid header
    pub async fn load_entries(entries: Vec<StationEntry>, source_path: &Path) -> (Self, LoadStats) {
        let start_time = Instant::now();
        let mut stats = LoadStats::new();
        let mut stations = Vec::with_capacity(entries.len());

        stats.entries_parsed = entries.len();

        for entry in entries {
            match Self::load_station(&entry, &mut stats).await {
                Some(station) => {
                    if stations
                        .iter()
                        .any(|existing: &Station| existing.name() == station.name())
                    {
                        warn!(
                            "Duplicate station name '{}' in {}, keeping both entries",
                            station.name(),
                            source_path.display()
                        );
                    }

                    info!(
                        "Station |{}| : angle file root |{}| {}",
                        station.name(),
                        station.grid_root(),
                        station.dimension()
                    );

                    match station.dimension() {
                        GridDimension::TwoD => stats.stations_2d += 1,
                        GridDimension::ThreeD => stats.stations_3d += 1,
                    }
                    stats.stations_loaded += 1;
                    stations.push(station);
                }
                None => continue,
            }
        }

        stats.load_duration = start_time.elapsed();
        info!("{}", stats.summary());

        (Self::from_stations(stations, source_path), stats)
    }

    /// Read one entry's grid header and build its station
    ///
    /// Returns `None` (recording why in `stats`) when the station is dropped.
    async fn load_station(entry: &StationEntry, stats: &mut LoadStats) -> Option<Station> {
        if entry.grid_root.is_empty() {
            warn!("Station '{}' has no grid root, skipping", entry.name);
            stats
                .malformed_headers
                .push(format!("{}: empty grid root", entry.name));
            return None;
        }

        let header_path = entry.header_path();
        let content = match tokio::fs::read_to_string(&header_path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Cannot open grid header file: {} ({})",
                    header_path.display(),
                    e
                );
                stats.missing_headers.push(header_path);
                return None;
            }
        };

        let header = match parse_grid_header(&content, &header_path) {
            Ok(header) => header,
            Err(e) => {
                warn!("Skipping station '{}': {}", entry.name, e);
                stats.malformed_headers.push(e.to_string());
                return None;
            }
        };

        debug!(
            "Grid header {}: {}x{}x{} {} ({})",
            header_path.display(),
            header.numx,
            header.numy,
            header.numz,
            header.grid_type,
            header.float_type
        );

        match Station::new(
            entry.name.clone(),
            entry.grid_root.clone(),
            header.dimension(),
            header.source,
            header.source_label.clone(),
        ) {
            Ok(station) => Some(station),
            Err(e) => {
                warn!("Skipping station '{}': {}", entry.name, e);
                stats.malformed_headers.push(e.to_string());
                None
            }
        }
    }
}
