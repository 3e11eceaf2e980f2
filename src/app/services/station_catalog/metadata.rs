//! Station catalog loading statistics
//!
//! Tracks what happened to every entry of a station definition file so the
//! CLI can report dropped stations without failing the run.

use std::path::PathBuf;

/// Statistics about the station catalog loading process
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    /// Station entries parsed from the definition file
    pub entries_parsed: usize,

    /// Non-blank lines that were not valid entries
    pub lines_skipped: usize,

    /// Stations added to the catalog
    pub stations_loaded: usize,

    /// Stations classified as 2D
    pub stations_2d: usize,

    /// Stations classified as 3D
    pub stations_3d: usize,

    /// Header files that could not be opened
    pub missing_headers: Vec<PathBuf>,

    /// Header files that opened but failed to parse
    pub malformed_headers: Vec<String>,

    /// Time taken to load the catalog
    pub load_duration: std::time::Duration,
}

impl LoadStats {
    /// Create new empty load statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries dropped from the catalog
    pub fn stations_dropped(&self) -> usize {
        self.entries_parsed.saturating_sub(self.stations_loaded)
    }

    /// Check whether any station was dropped
    pub fn has_dropped_stations(&self) -> bool {
        self.stations_dropped() > 0
    }

    /// Get a summary string of the loading process
    pub fn summary(&self) -> String {
        format!(
            "Loaded {} stations ({} 2D, {} 3D) from {} entries, {} dropped, in {:.2}s",
            self.stations_loaded,
            self.stations_2d,
            self.stations_3d,
            self.entries_parsed,
            self.stations_dropped(),
            self.load_duration.as_secs_f64()
        )
    }
}
