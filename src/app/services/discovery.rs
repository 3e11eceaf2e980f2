//! Station and scatter file discovery for batch runs
//!
//! A NonLinLoc run tree holds one angle grid per station and phase, named
//! `<gridroot>.<PHASE>.<STATION>.angle.{hdr,buf}`, and scatter files named
//! `<scatterroot>*.scat`. Batch mode discovers both, writes a station
//! definition file, and converts every scatter file without an output yet.

use crate::app::models::GridSampling;
use crate::app::services::angle_writer::output_path_for;
use crate::app::services::station_catalog::StationEntry;
use crate::constants::{ANGLE_HEADER_SUFFIX, DEFAULT_PHASE, SCATTER_EXTENSION, STATIONS_FILE_NAME};
use crate::{Error, Result};
use anyhow::Context;
use glob::Pattern;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Batch control file contents
///
/// ```text
/// <grid root>
/// <scatter root>
/// [phase, default P]
/// [grid sampling: anything but "false", blank included, means weighted]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BatchControl {
    pub grid_root: String,
    pub scatter_root: String,
    pub phase: String,
    /// Sampling mode from the control file, if given
    pub grid_sampling: Option<GridSampling>,
}

impl BatchControl {
    /// Read and parse a control file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::control_file(
                path.display().to_string(),
                format!("Cannot read control file: {}", e),
            )
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let lines: Vec<&str> = content.lines().map(str::trim).collect();
        let display = path.display().to_string();

        let grid_root = match lines.first() {
            Some(line) if !line.is_empty() => line.to_string(),
            _ => return Err(Error::control_file(display, "Missing grid root on line 1")),
        };
        let scatter_root = match lines.get(1) {
            Some(line) if !line.is_empty() => line.to_string(),
            _ => return Err(Error::control_file(display, "Missing scatter root on line 2")),
        };
        let phase = match lines.get(2) {
            Some(line) if !line.is_empty() => line.to_string(),
            _ => DEFAULT_PHASE.to_string(),
        };
        // A present line 4, even blank, decides the sampling
        let grid_sampling = lines
            .get(3)
            .map(|line| GridSampling::from_bool(!line.eq_ignore_ascii_case("false")));

        Ok(Self {
            grid_root,
            scatter_root,
            phase,
            grid_sampling,
        })
    }

    /// Sampling from the control file, else from the `--grid` flag
    pub fn resolve_grid_sampling(&self, grid_flag: bool) -> GridSampling {
        self.grid_sampling
            .unwrap_or_else(|| GridSampling::from_bool(grid_flag))
    }
}

fn station_name_regex() -> &'static Regex {
    static STATION_NAME: OnceLock<Regex> = OnceLock::new();
    STATION_NAME.get_or_init(|| {
        Regex::new(r"\.([^./\\]+)\.angle\.hdr$").expect("station name pattern is a valid regex")
    })
}

/// Station name from an angle header path: the segment before `.angle.hdr`
pub fn station_name_from_header(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    station_name_regex()
        .captures(file_name)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

/// Find angle grids for `phase` under `grid_root`, sorted by path
pub fn discover_stations(grid_root: &str, phase: &str) -> anyhow::Result<Vec<StationEntry>> {
    let pattern = format!(
        "{}*.{}.*{}",
        Pattern::escape(grid_root),
        Pattern::escape(phase),
        ANGLE_HEADER_SUFFIX
    );
    debug!("Searching for angle grids: {}", pattern);

    let mut headers = glob::glob(&pattern)
        .with_context(|| format!("Invalid angle grid pattern {}", pattern))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to read angle grid directory")?;
    headers.sort();

    let mut entries = Vec::with_capacity(headers.len());
    for header in headers {
        let Some(name) = station_name_from_header(&header) else {
            debug!("Skipping unrecognised header {}", header.display());
            continue;
        };
        let header_str = header
            .to_str()
            .with_context(|| format!("Non UTF-8 grid path {}", header.display()))?;
        let grid_root = header_str
            .strip_suffix(".hdr")
            .unwrap_or(header_str)
            .to_string();

        entries.push(StationEntry { name, grid_root });
    }

    info!(
        "Found {} {} phase angle grids under {}",
        entries.len(),
        phase,
        grid_root
    );
    Ok(entries)
}

/// Glob prefix for a grid path; a directory gets a trailing separator
pub fn grid_search_root(grid_path: &str) -> String {
    if Path::new(grid_path).is_dir() {
        let trimmed = grid_path.trim_end_matches(std::path::MAIN_SEPARATOR);
        format!("{}{}", trimmed, std::path::MAIN_SEPARATOR)
    } else {
        grid_path.to_string()
    }
}

/// Location of the generated station file: `stations.txt` beside the grids
pub fn station_file_path(grid_root: &str) -> PathBuf {
    match Path::new(grid_root).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(STATIONS_FILE_NAME),
        _ => PathBuf::from(STATIONS_FILE_NAME),
    }
}

/// Write a station definition file for discovered stations
pub async fn write_station_file(path: &Path, entries: &[StationEntry]) -> anyhow::Result<()> {
    let content: String = entries
        .iter()
        .map(|entry| format!("{}\n", entry.to_line()))
        .collect();

    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write station file {}", path.display()))?;

    info!(
        "Wrote {} stations to {}",
        entries.len(),
        path.display()
    );
    Ok(())
}

/// Scatter files under `scatter_root` that have no output file yet, sorted
pub fn find_unconverted_scatter_files(scatter_root: &str) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = format!("{}*.{}", Pattern::escape(scatter_root), SCATTER_EXTENSION);
    debug!("Searching for scatter files: {}", pattern);

    let mut files = glob::glob(&pattern)
        .with_context(|| format!("Invalid scatter file pattern {}", pattern))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to read scatter directory")?;
    files.sort();

    let total = files.len();
    files.retain(|file| {
        let converted = output_path_for(file).exists();
        if converted {
            debug!("Skipping {}: already converted", file.display());
        }
        !converted
    });

    info!(
        "Found {} scatter files, {} still to convert",
        total,
        files.len()
    );
    Ok(files)
}
