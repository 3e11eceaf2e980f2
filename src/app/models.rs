//! Core data models for scatter-to-angle conversion
//!
//! Stations, scatter points and the angle records resolved for them.
//! Constructors validate their inputs the same way across the crate:
//! invalid values are rejected with [`Error::Configuration`] or a stage-specific
//! error rather than silently clamped.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dimensionality of a station's take-off angle grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridDimension {
    /// Radially symmetric grid indexed by epicentral distance and depth
    TwoD,
    /// Full 3-D grid indexed by x, y and z
    ThreeD,
}

impl GridDimension {
    /// Short label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            GridDimension::TwoD => "2D",
            GridDimension::ThreeD => "3D",
        }
    }
}

impl fmt::Display for GridDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Station (grid source) location read from a grid header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SourceLocation {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A catalogued station with its angle grid
///
/// Immutable once constructed; the catalog hands out shared references only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    name: String,
    grid_root: String,
    dimension: GridDimension,
    source: SourceLocation,
    label: String,
}

impl Station {
    /// Create a new station, rejecting empty names and grid roots
    pub fn new(
        name: impl Into<String>,
        grid_root: impl Into<String>,
        dimension: GridDimension,
        source: SourceLocation,
        label: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let grid_root = grid_root.into();

        if name.trim().is_empty() {
            return Err(Error::configuration("Station name cannot be empty"));
        }
        if grid_root.trim().is_empty() {
            return Err(Error::configuration(format!(
                "Grid root for station '{}' cannot be empty",
                name
            )));
        }

        Ok(Self {
            name,
            grid_root,
            dimension,
            source,
            label: label.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid file path prefix, without `.hdr` / `.buf`
    pub fn grid_root(&self) -> &str {
        &self.grid_root
    }

    pub fn dimension(&self) -> GridDimension {
        self.dimension
    }

    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    /// Source label from the grid header
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_2d(&self) -> bool {
        self.dimension == GridDimension::TwoD
    }
}

/// One sample of the location probability distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Probability or weight, depending on the sampling mode
    pub p: f64,
}

impl ScatterPoint {
    pub fn new(x: f64, y: f64, z: f64, p: f64) -> Self {
        Self { x, y, z, p }
    }

    /// Widen an on-disk f32 record
    pub fn from_f32(x: f32, y: f32, z: f32, p: f32) -> Self {
        Self {
            x: f64::from(x),
            y: f64::from(y),
            z: f64::from(z),
            p: f64::from(p),
        }
    }
}

/// Take-off angle observed at one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleRecord {
    pub station_name: String,
    /// Ray azimuth as reported by the grid query
    pub azimuth: f64,
    /// Ray dip as reported by the grid query
    pub dip: f64,
    /// Quality flag, informational only
    pub quality: i32,
}

/// All station angles for one scatter point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAngles {
    pub p: f64,
    pub angles: Vec<AngleRecord>,
}

impl SampleAngles {
    pub fn new(p: f64, angles: Vec<AngleRecord>) -> Self {
        Self { p, angles }
    }

    /// Station names in the order the angles were resolved
    pub fn station_names(&self) -> impl Iterator<Item = &str> {
        self.angles.iter().map(|record| record.station_name.as_str())
    }
}

/// Resolved angles for a whole scatter cloud, in input order
///
/// Every sample carries one record per station in the same order as
/// `station_names`; [`AngleResultSet::push`] refuses samples that break this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleResultSet {
    station_names: Vec<String>,
    samples: Vec<SampleAngles>,
}

impl AngleResultSet {
    /// Create an empty result set for the given station order
    pub fn new(station_names: Vec<String>) -> Self {
        Self {
            station_names,
            samples: Vec::new(),
        }
    }

    /// Create an empty result set with room for `capacity` samples
    pub fn with_capacity(station_names: Vec<String>, capacity: usize) -> Self {
        Self {
            station_names,
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append a sample, checking it follows the station order
    pub fn push(&mut self, sample: SampleAngles) -> Result<()> {
        if sample.angles.len() != self.station_names.len() {
            return Err(Error::grid_query(
                "result set",
                format!(
                    "sample has {} station angles, expected {}",
                    sample.angles.len(),
                    self.station_names.len()
                ),
            ));
        }

        if let Some((expected, found)) = self
            .station_names
            .iter()
            .zip(sample.station_names())
            .find(|(expected, found)| expected.as_str() != *found)
        {
            return Err(Error::grid_query(
                "result set",
                format!(
                    "station order mismatch: expected '{}', found '{}'",
                    expected, found
                ),
            ));
        }

        self.samples.push(sample);
        Ok(())
    }

    pub fn station_names(&self) -> &[String] {
        &self.station_names
    }

    pub fn samples(&self) -> &[SampleAngles] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SampleAngles> {
        self.samples.iter()
    }
}

impl<'a> IntoIterator for &'a AngleResultSet {
    type Item = &'a SampleAngles;
    type IntoIter = std::slice::Iter<'a, SampleAngles>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// How the scatter samples were drawn
///
/// Weighted keeps each sample's probability in the output; uniform sampling
/// (e.g. Markov chain draws) writes a constant weight of `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GridSampling {
    Weighted,
    #[default]
    Uniform,
}

impl GridSampling {
    /// Interpret the integer command-line flag
    ///
    /// Zero means uniform and any positive value means weighted. Negative
    /// values are rejected.
    pub fn from_flag(flag: i64) -> Result<Self> {
        match flag {
            0 => Ok(GridSampling::Uniform),
            f if f > 0 => Ok(GridSampling::Weighted),
            f => Err(Error::configuration(format!(
                "Grid sampling flag must be 0 (uniform) or a positive integer (weighted), got {}",
                f
            ))),
        }
    }

    pub fn from_bool(weighted: bool) -> Self {
        if weighted {
            GridSampling::Weighted
        } else {
            GridSampling::Uniform
        }
    }

    pub fn is_weighted(&self) -> bool {
        matches!(self, GridSampling::Weighted)
    }
}

impl FromStr for GridSampling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let flag: i64 = s.trim().parse().map_err(|_| {
            Error::configuration(format!(
                "Grid sampling flag must be an integer, got '{}'",
                s.trim()
            ))
        })?;
        Self::from_flag(flag)
    }
}
