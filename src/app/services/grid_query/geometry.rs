//! Epicentral distance and azimuth
//!
//! Rectangular mode works in kilometres on a plane. Global mode treats x as
//! longitude and y as latitude in degrees on a sphere.

use crate::app::models::SourceLocation;
use crate::config::GeometryMode;
use crate::constants::DEG2KM;

/// Horizontal distance in kilometres
pub fn epicentral_distance(mode: GeometryMode, source: &SourceLocation, x: f64, y: f64) -> f64 {
    match mode {
        GeometryMode::Rectangular => {
            let dx = x - source.x;
            let dy = y - source.y;
            (dx * dx + dy * dy).sqrt()
        }
        GeometryMode::Global => great_circle_degrees(source.y, source.x, y, x) * DEG2KM,
    }
}

/// Azimuth in degrees clockwise from north, in `[0, 360)`
pub fn epicentral_azimuth(mode: GeometryMode, source: &SourceLocation, x: f64, y: f64) -> f64 {
    let azimuth = match mode {
        GeometryMode::Rectangular => (x - source.x).atan2(y - source.y).to_degrees(),
        GeometryMode::Global => initial_bearing(source.y, source.x, y, x),
    };
    normalize_degrees(azimuth)
}

/// Wrap an angle into `[0, 360)`
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn great_circle_degrees(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let central = 2.0 * a.sqrt().min(1.0).asin();
    central.to_degrees()
}

fn initial_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlon = (lon2 - lon1).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees()
}
