//! Station definition and grid header parsing
//!
//! This module handles the two text formats the catalog is built from:
//! - Station definition lines (`NAME:GRIDROOT;trailing`)
//! - NonLinLoc grid header files (`GRIDROOT.hdr`)

use crate::app::models::{GridDimension, SourceLocation};
use crate::constants::{
    DEGENERATE_GRID_SPACING, GRID_HEADER_EXTENSION, GRID_TYPE_ANGLE_2D, STATION_ENTRY_TERMINATOR,
    STATION_NAME_SEPARATOR,
};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// One `NAME:GRIDROOT;` entry from a station definition file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationEntry {
    pub name: String,
    pub grid_root: String,
}

impl StationEntry {
    /// Path of the grid header belonging to this entry
    pub fn header_path(&self) -> PathBuf {
        header_path_for(&self.grid_root)
    }

    /// Render back to station file syntax
    pub fn to_line(&self) -> String {
        format!(
            "{}{}{}{}",
            self.name, STATION_NAME_SEPARATOR, self.grid_root, STATION_ENTRY_TERMINATOR
        )
    }
}

/// Header path for a grid root: plain concatenation with `.hdr`
pub fn header_path_for(grid_root: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", grid_root, GRID_HEADER_EXTENSION))
}

/// Parse a single station definition line
///
/// Returns `None` for blank lines, lines without a `:` separator and lines
/// with an empty station name. Everything after the first `;` that follows
/// the separator is ignored; without a `;` the rest of the line is the root.
pub fn parse_station_line(line: &str) -> Option<StationEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (name, rest) = line.split_once(STATION_NAME_SEPARATOR)?;

    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let grid_root = match rest.find(STATION_ENTRY_TERMINATOR) {
        Some(end) => &rest[..end],
        None => rest,
    }
    .trim();

    Some(StationEntry {
        name: name.to_string(),
        grid_root: grid_root.to_string(),
    })
}

/// Parse every entry of a station definition file, in file order
pub fn parse_station_file(content: &str) -> (Vec<StationEntry>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0;

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_station_line(line) {
            Some(entry) => entries.push(entry),
            None => skipped += 1,
        }
    }

    (entries, skipped)
}

/// Grid description read from a NonLinLoc `.hdr` file
#[derive(Debug, Clone, PartialEq)]
pub struct GridHeader {
    pub numx: usize,
    pub numy: usize,
    pub numz: usize,
    pub origx: f64,
    pub origy: f64,
    pub origz: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    /// Grid type tag, e.g. `ANGLE` or `ANGLE2D`
    pub grid_type: String,
    /// Storage type tag, e.g. `FLOAT`
    pub float_type: String,
    pub source_label: String,
    pub source: SourceLocation,
}

impl GridHeader {
    /// Read and parse a header file
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Cannot open grid header {}", path.display()), e))?;
        parse_grid_header(&content, path)
    }

    /// Grid dimensionality from the type tag
    pub fn dimension(&self) -> GridDimension {
        if self.grid_type.eq_ignore_ascii_case(GRID_TYPE_ANGLE_2D) {
            GridDimension::TwoD
        } else {
            GridDimension::ThreeD
        }
    }

    /// Total number of grid nodes, `None` if it does not fit in `usize`
    pub fn node_count(&self) -> Option<usize> {
        self.numx
            .checked_mul(self.numy)
            .and_then(|count| count.checked_mul(self.numz))
    }
}

/// Parse the whitespace-separated fields of a grid header
///
/// Layout: `numx numy numz origx origy origz dx dy dz type float_type` then
/// `label srcx srcy srcz`. Any further content (transform lines) is ignored.
pub fn parse_grid_header(content: &str, path: &Path) -> Result<GridHeader> {
    let display = path.display().to_string();
    let mut tokens = content.split_whitespace();

    fn next_field<'a>(
        tokens: &mut std::str::SplitWhitespace<'a>,
        field: &str,
        path: &str,
    ) -> Result<&'a str> {
        tokens
            .next()
            .ok_or_else(|| Error::grid_header(path, format!("Missing field '{}'", field)))
    }

    fn parse_count(value: &str, field: &str, path: &str) -> Result<usize> {
        let count: i64 = value.parse().map_err(|_| {
            Error::grid_header(path, format!("Invalid {} '{}': expected integer", field, value))
        })?;
        if count < 1 {
            return Err(Error::grid_header(
                path,
                format!("Invalid {} {}: must be at least 1", field, count),
            ));
        }
        Ok(count as usize)
    }

    fn parse_float(value: &str, field: &str, path: &str) -> Result<f64> {
        value.parse().map_err(|_| {
            Error::grid_header(path, format!("Invalid {} '{}': expected number", field, value))
        })
    }

    let numx = parse_count(next_field(&mut tokens, "numx", &display)?, "numx", &display)?;
    let numy = parse_count(next_field(&mut tokens, "numy", &display)?, "numy", &display)?;
    let numz = parse_count(next_field(&mut tokens, "numz", &display)?, "numz", &display)?;
    if numx
        .checked_mul(numy)
        .and_then(|count| count.checked_mul(numz))
        .is_none()
    {
        return Err(Error::grid_header(
            &display,
            format!("Grid of {} x {} x {} nodes is too large", numx, numy, numz),
        ));
    }
    let origx = parse_float(next_field(&mut tokens, "origx", &display)?, "origx", &display)?;
    let origy = parse_float(next_field(&mut tokens, "origy", &display)?, "origy", &display)?;
    let origz = parse_float(next_field(&mut tokens, "origz", &display)?, "origz", &display)?;
    let mut dx = parse_float(next_field(&mut tokens, "dx", &display)?, "dx", &display)?;
    let dy = parse_float(next_field(&mut tokens, "dy", &display)?, "dy", &display)?;
    let dz = parse_float(next_field(&mut tokens, "dz", &display)?, "dz", &display)?;
    let grid_type = next_field(&mut tokens, "grid type", &display)?.to_string();
    let float_type = next_field(&mut tokens, "float type", &display)?.to_string();
    let source_label = next_field(&mut tokens, "source label", &display)?.to_string();
    let srcx = parse_float(next_field(&mut tokens, "source x", &display)?, "source x", &display)?;
    let srcy = parse_float(next_field(&mut tokens, "source y", &display)?, "source y", &display)?;
    let srcz = parse_float(next_field(&mut tokens, "source z", &display)?, "source z", &display)?;

    // 2D grids have a single x column and may carry a zero spacing
    if numx == 1 {
        dx = DEGENERATE_GRID_SPACING;
    }

    Ok(GridHeader {
        numx,
        numy,
        numz,
        origx,
        origy,
        origz,
        dx,
        dy,
        dz,
        grid_type,
        float_type,
        source_label,
        source: SourceLocation::new(srcx, srcy, srcz),
    })
}
