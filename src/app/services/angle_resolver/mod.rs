//! Per-point take-off angle resolution
//!
//! For one scatter point, asks the grid query service for the take-off angle
//! at every catalogued station and returns the records in catalog order.
//!
//! 2D grids are radially symmetric about the station, so they are queried at
//! `(0, distance, z)` with the station-to-point azimuth. In global geometry the
//! distance is converted to degrees first. 3D grids are queried directly at
//! `(x, y, z)` with the 3D sentinel azimuth.

use crate::app::models::{AngleRecord, GridDimension, SampleAngles, ScatterPoint, Station};
use crate::app::services::grid_query::{GridQueryService, TakeOffAngle};
use crate::app::services::station_catalog::StationCatalog;
use crate::constants::{KM2DEG, THREE_D_QUERY_SENTINEL};
use crate::Result;
use std::sync::Arc;
use tracing::trace;

/// Resolves take-off angles for scatter points against a station catalog
pub struct AngleResolver<Q: GridQueryService> {
    catalog: Arc<StationCatalog>,
    grid_query: Arc<Q>,
}

impl<Q: GridQueryService> Clone for AngleResolver<Q> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            grid_query: Arc::clone(&self.grid_query),
        }
    }
}

impl<Q: GridQueryService> AngleResolver<Q> {
    pub fn new(catalog: Arc<StationCatalog>, grid_query: Arc<Q>) -> Self {
        Self {
            catalog,
            grid_query,
        }
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// Resolve every station's angle for one point, carrying its probability
    pub fn resolve(&self, point: &ScatterPoint) -> Result<SampleAngles> {
        let mut angles = Vec::with_capacity(self.catalog.len());

        for station in self.catalog.iter() {
            let angle = self.resolve_station(station, point.x, point.y, point.z)?;
            angles.push(AngleRecord {
                station_name: station.name().to_string(),
                azimuth: angle.azimuth,
                dip: angle.dip,
                quality: angle.quality,
            });
        }

        Ok(SampleAngles::new(point.p, angles))
    }

    /// Take-off angle at one station for a point at `(x, y, z)`
    pub fn resolve_station(&self, station: &Station, x: f64, y: f64, z: f64) -> Result<TakeOffAngle> {
        let angle = match station.dimension() {
            GridDimension::TwoD => {
                let source = station.source();
                let mut distance = self.grid_query.epicentral_distance(source, x, y);
                let azimuth = self.grid_query.epicentral_azimuth(source, x, y);
                if self.grid_query.geometry_mode().is_global() {
                    distance *= KM2DEG;
                }
                self.grid_query
                    .query_take_off_angle(station.grid_root(), 0.0, distance, z, azimuth)?
            }
            GridDimension::ThreeD => self.grid_query.query_take_off_angle(
                station.grid_root(),
                x,
                y,
                z,
                THREE_D_QUERY_SENTINEL,
            )?,
        };

        trace!(
            "{} at ({}, {}, {}): azimuth {} dip {} quality {}",
            station.name(),
            x,
            y,
            z,
            angle.azimuth,
            angle.dip,
            angle.quality
        );
        Ok(angle)
    }
}
