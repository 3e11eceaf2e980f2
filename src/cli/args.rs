//! Command-line argument definitions for scatangle
//!
//! The bare positional form `scatangle <scatter> <stations> <gridSampling>`
//! is kept for compatibility with existing NonLinLoc scripts and maps onto the
//! `convert` subcommand.

use crate::app::models::GridSampling;
use crate::config::{AngleConfig, ByteOrderMode, GeometryMode};
use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_PHASE, MAX_WORKERS};
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the scatter-to-angle converter
///
/// Converts NonLinLoc location scatter clouds into per-station ray take-off
/// angles for focal mechanism sampling.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scatangle",
    version,
    about = "Convert NonLinLoc scatter clouds to per-station take-off angle samples",
    long_about = "Reads a binary NonLinLoc .scat location cloud and a station definition file, \
                  looks up the ray take-off angle of every sample at every station in the \
                  NonLinLoc angle grids, and writes a .scatangle text file for focal mechanism \
                  and moment tensor sampling.",
    args_conflicts_with_subcommands = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Binary scatter file (positional form)
    #[arg(value_name = "SCATTER_FILE")]
    pub scatter_file: Option<PathBuf>,

    /// Station definition file (positional form)
    #[arg(value_name = "STATION_FILE")]
    pub station_file: Option<PathBuf>,

    /// Grid sampling flag: 0 for uniform, positive for weighted (positional form)
    #[arg(value_name = "GRID_SAMPLING", allow_negative_numbers = true)]
    pub grid_sampling: Option<i64>,

    #[command(flatten)]
    pub options: RunOptions,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Convert one scatter file (same as the positional form)
    Convert(ConvertArgs),
    /// Discover stations and convert every scatter file listed by a control file
    Batch(BatchArgs),
    /// Print station take-off angles for a single point
    Point(PointArgs),
    /// Report the station catalog and grid classification
    Stations(StationsArgs),
}

/// Options shared by every command
#[derive(Debug, Clone, clap::Args)]
pub struct RunOptions {
    /// Coordinate system of grids and scatter points
    #[arg(
        long = "geometry",
        value_enum,
        default_value = "rectangular",
        help = "Grid geometry: rectangular (km) or global (degrees)"
    )]
    pub geometry: GeometryMode,

    /// Byte order of scatter files and grid buffers
    #[arg(
        long = "endian",
        value_enum,
        default_value = "little",
        help = "Byte order of binary scatter and grid files"
    )]
    pub endian: ByteOrderMode,

    /// Number of parallel resolution workers (defaults to CPU count)
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        help = "Number of parallel resolution workers"
    )]
    pub workers: Option<usize>,

    /// Samples resolved per worker task
    #[arg(
        long = "chunk-size",
        value_name = "SAMPLES",
        default_value_t = DEFAULT_CHUNK_SIZE,
        help = "Scatter samples resolved per worker task"
    )]
    pub chunk_size: usize,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Arguments for the convert command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Binary scatter file; output is written to `<file>angle`
    #[arg(value_name = "SCATTER_FILE")]
    pub scatter_file: PathBuf,

    /// Station definition file of `NAME:GRIDROOT;` lines
    #[arg(value_name = "STATION_FILE")]
    pub station_file: PathBuf,

    /// 0 writes a unit weight per sample, a positive value keeps probabilities
    #[arg(value_name = "GRID_SAMPLING", allow_negative_numbers = true)]
    pub grid_sampling: i64,

    #[command(flatten)]
    pub options: RunOptions,
}

/// Arguments for the batch command
#[derive(Debug, Clone, Parser)]
pub struct BatchArgs {
    /// Control file: grid root, scatter root, optional phase and sampling lines
    #[arg(value_name = "CONTROL_FILE")]
    pub control_file: PathBuf,

    /// Keep sample probabilities when the control file does not say
    #[arg(short = 'g', long = "grid", help = "Use weighted (grid) sampling by default")]
    pub grid: bool,

    #[command(flatten)]
    pub options: RunOptions,
}

/// Arguments for the point command
#[derive(Debug, Clone, Parser)]
pub struct PointArgs {
    /// X coordinate (km, grid frame)
    #[arg(allow_negative_numbers = true)]
    pub x: f64,

    /// Y coordinate (km, grid frame)
    #[arg(allow_negative_numbers = true)]
    pub y: f64,

    /// Depth (km)
    #[arg(allow_negative_numbers = true)]
    pub z: f64,

    /// Angle grid root, e.g. `time/layer`, or a directory of angle grids
    #[arg(
        long = "grid-path",
        value_name = "ROOT",
        help = "Angle grid root path prefix or grid directory"
    )]
    pub grid_path: String,

    /// Seismic phase of the grids
    #[arg(long = "phase", default_value = DEFAULT_PHASE, help = "Phase of the angle grids")]
    pub phase: String,

    #[command(flatten)]
    pub options: RunOptions,
}

/// Arguments for the stations command
#[derive(Debug, Clone, Parser)]
pub struct StationsArgs {
    /// Station definition file
    #[arg(value_name = "STATION_FILE")]
    pub station_file: PathBuf,

    /// Output format for station report
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        help = "Output format for station report"
    )]
    pub output_format: OutputFormat,

    /// Output file for the report; stdout if not given
    #[arg(
        short = 'o',
        long = "output-file",
        value_name = "FILE",
        help = "Output file for station report"
    )]
    pub output_file: Option<PathBuf>,

    #[command(flatten)]
    pub options: RunOptions,
}

/// Output format options for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
    /// CSV format for data analysis
    Csv,
}

impl Args {
    /// Command to run, mapping the positional form onto `convert`
    ///
    /// Returns `None` when neither a subcommand nor the positional
    /// arguments were given.
    pub fn resolve_command(&self) -> Result<Option<Commands>> {
        if let Some(command) = &self.command {
            return Ok(Some(command.clone()));
        }

        match (&self.scatter_file, &self.station_file, self.grid_sampling) {
            (None, None, None) => Ok(None),
            (Some(scatter_file), Some(station_file), Some(grid_sampling)) => {
                Ok(Some(Commands::Convert(ConvertArgs {
                    scatter_file: scatter_file.clone(),
                    station_file: station_file.clone(),
                    grid_sampling,
                    options: self.options.clone(),
                })))
            }
            _ => Err(Error::configuration(
                "Usage: scatangle <SCATTER_FILE> <STATION_FILE> <GRID_SAMPLING>",
            )),
        }
    }
}

impl RunOptions {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Validate option values
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(Error::configuration(
                    "Number of workers must be greater than 0",
                ));
            }
            if workers > MAX_WORKERS {
                return Err(Error::configuration(format!(
                    "Number of workers cannot exceed {}",
                    MAX_WORKERS
                )));
            }
        }

        if self.chunk_size == 0 {
            return Err(Error::configuration("Chunk size must be greater than 0"));
        }

        Ok(())
    }

    /// Build a run configuration from the options
    pub fn to_config(&self, grid_sampling: GridSampling) -> AngleConfig {
        let mut config = AngleConfig::default()
            .with_geometry_mode(self.geometry)
            .with_byte_order(self.endian)
            .with_chunk_size(self.chunk_size)
            .with_progress(self.show_progress())
            .with_grid_sampling(grid_sampling);

        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config
    }
}

impl ConvertArgs {
    /// Validate the convert command arguments
    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;
        self.get_grid_sampling()?;
        Ok(())
    }

    /// Sampling mode from the integer flag
    pub fn get_grid_sampling(&self) -> Result<GridSampling> {
        GridSampling::from_flag(self.grid_sampling)
    }
}

impl BatchArgs {
    pub fn validate(&self) -> Result<()> {
        self.options.validate()
    }
}

impl PointArgs {
    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;

        if self.grid_path.trim().is_empty() {
            return Err(Error::configuration("Grid path cannot be empty"));
        }
        if !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite()) {
            return Err(Error::configuration("Point coordinates must be finite"));
        }

        Ok(())
    }
}

impl StationsArgs {
    pub fn validate(&self) -> Result<()> {
        self.options.validate()
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            geometry: GeometryMode::Rectangular,
            endian: ByteOrderMode::Little,
            workers: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            verbose: 0,
            quiet: false,
        }
    }
}
