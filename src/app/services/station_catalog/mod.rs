//! Station catalog: the ordered set of stations angles are resolved for
//!
//! The catalog is loaded from a station definition file and the grid header of
//! every entry. Its order is the column order of every angle record written for
//! a run, so it is fixed at load time and only exposed read-only.

use crate::app::models::{GridDimension, Station};
use std::path::{Path, PathBuf};

pub mod loader;
pub mod metadata;
pub mod parser;

#[cfg(test)]
pub mod tests;

// Re-export key types for convenience
pub use metadata::LoadStats;
pub use parser::{GridHeader, StationEntry, header_path_for, parse_station_line};

/// Ordered, immutable station catalog
#[derive(Debug, Clone)]
pub struct StationCatalog {
    /// Stations in definition-file order
    stations: Vec<Station>,

    /// Station definition file the catalog was loaded from
    source_path: PathBuf,
}

impl StationCatalog {
    /// Build a catalog from stations already in their final order
    pub fn from_stations(stations: Vec<Station>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            stations,
            source_path: source_path.into(),
        }
    }

    /// Number of stations, i.e. angle records per sample
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Get station by catalog position
    pub fn get(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    /// Find a station by name
    pub fn find(&self, name: &str) -> Option<&Station> {
        self.stations.iter().find(|station| station.name() == name)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Station> {
        self.stations.iter()
    }

    /// Station names in catalog order
    pub fn names(&self) -> Vec<String> {
        self.stations
            .iter()
            .map(|station| station.name().to_string())
            .collect()
    }

    /// Count stations of one dimensionality
    pub fn count_by_dimension(&self, dimension: GridDimension) -> usize {
        self.stations
            .iter()
            .filter(|station| station.dimension() == dimension)
            .count()
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

impl<'a> IntoIterator for &'a StationCatalog {
    type Item = &'a Station;
    type IntoIter = std::slice::Iter<'a, Station>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}
