//! Grid query service
//!
//! Take-off angle lookup is a capability injected into the resolver. The
//! NonLinLoc implementation reads angle grids from disk; tests substitute a
//! recording double.

pub mod geometry;
pub mod nlloc;

pub use nlloc::NllocGridQuery;

use crate::Result;
use crate::app::models::SourceLocation;
use crate::config::GeometryMode;
use serde::{Deserialize, Serialize};

/// Ray take-off angle returned by a grid lookup
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TakeOffAngle {
    pub azimuth: f64,
    pub dip: f64,
    /// Grid quality flag (0 = unusable, up to 15)
    pub quality: i32,
}

impl TakeOffAngle {
    pub fn new(azimuth: f64, dip: f64, quality: i32) -> Self {
        Self {
            azimuth,
            dip,
            quality,
        }
    }

    /// Angle returned for points the grid cannot answer
    pub fn degenerate() -> Self {
        Self::default()
    }

    pub fn is_degenerate(&self) -> bool {
        self.quality == 0
    }
}

/// Take-off angle lookup over station angle grids
///
/// Implementations must be safe to query from several blocking workers at
/// once.
pub trait GridQueryService: Send + Sync {
    /// One-time initialization before any query
    fn set_constants(&self) -> Result<()> {
        Ok(())
    }

    /// Coordinate system the service works in
    fn geometry_mode(&self) -> GeometryMode;

    /// Horizontal distance from `source` to `(x, y)` in kilometres
    fn epicentral_distance(&self, source: &SourceLocation, x: f64, y: f64) -> f64;

    /// Azimuth from `source` to `(x, y)` in degrees clockwise from north
    fn epicentral_azimuth(&self, source: &SourceLocation, x: f64, y: f64) -> f64;

    /// Look up the take-off angle in the grid at `grid_root`
    ///
    /// `ref_azimuth` is the station azimuth for 2D grids, or
    /// [`THREE_D_QUERY_SENTINEL`](crate::constants::THREE_D_QUERY_SENTINEL)
    /// for 3D grids.
    fn query_take_off_angle(
        &self,
        grid_root: &str,
        coord1: f64,
        coord2: f64,
        z: f64,
        ref_azimuth: f64,
    ) -> Result<TakeOffAngle>;
}

impl<T: GridQueryService + ?Sized> GridQueryService for std::sync::Arc<T> {
    fn set_constants(&self) -> Result<()> {
        (**self).set_constants()
    }

    fn geometry_mode(&self) -> GeometryMode {
        (**self).geometry_mode()
    }

    fn epicentral_distance(&self, source: &SourceLocation, x: f64, y: f64) -> f64 {
        (**self).epicentral_distance(source, x, y)
    }

    fn epicentral_azimuth(&self, source: &SourceLocation, x: f64, y: f64) -> f64 {
        (**self).epicentral_azimuth(source, x, y)
    }

    fn query_take_off_angle(
        &self,
        grid_root: &str,
        coord1: f64,
        coord2: f64,
        z: f64,
        ref_azimuth: f64,
    ) -> Result<TakeOffAngle> {
        (**self).query_take_off_angle(grid_root, coord1, coord2, z, ref_azimuth)
    }
}
