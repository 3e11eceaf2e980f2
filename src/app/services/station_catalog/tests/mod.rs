//! Shared test utilities and fixtures for station catalog tests

use std::fs;
use std::path::{Path, PathBuf};

pub mod loader_tests;
pub mod parser_tests;

/// Header of a 2D angle grid: one x column, distance along y
pub fn two_d_header(label: &str, x: f64, y: f64, z: f64) -> String {
    format!(
        "1 101 51  0.0 0.0 0.0  0.0 1.0 1.0 ANGLE2D FLOAT\n{} {} {} {}\n",
        label, x, y, z
    )
}

/// Header of a 3D angle grid centred on the origin
pub fn three_d_header(label: &str, x: f64, y: f64, z: f64) -> String {
    format!(
        "21 21 11  -10.0 -10.0 0.0  1.0 1.0 1.0 ANGLE FLOAT\n{} {} {} {}\n",
        label, x, y, z
    )
}

/// Write `<dir>/<root_name>.hdr` and return the grid root
pub fn write_header(dir: &Path, root_name: &str, content: &str) -> std::io::Result<String> {
    let root = dir.join(root_name);
    let root = root.to_string_lossy().to_string();
    fs::write(format!("{}.hdr", root), content)?;
    Ok(root)
}

/// Write a station definition file from `(name, root)` pairs
pub fn write_station_file(dir: &Path, entries: &[(&str, &str)]) -> std::io::Result<PathBuf> {
    let content: String = entries
        .iter()
        .map(|(name, root)| format!("{}:{};\n", name, root))
        .collect();
    let path = dir.join("stations.txt");
    fs::write(&path, content)?;
    Ok(path)
}
