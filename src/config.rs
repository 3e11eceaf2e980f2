//! Configuration management and validation.
//!
//! Provides the run configuration for scatter-to-angle conversion: the
//! geometry mode the grid query works in, binary byte order, and the
//! concurrency and progress settings of the resolution pipeline.

use crate::app::models::GridSampling;
use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_PROGRESS_INTERVAL, MAX_WORKERS};
use crate::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Coordinate system of the grids and scatter points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum GeometryMode {
    /// Cartesian kilometres
    #[default]
    Rectangular,
    /// Longitude/latitude in degrees; 2D grids are indexed in degrees
    Global,
}

impl GeometryMode {
    pub fn is_global(&self) -> bool {
        matches!(self, GeometryMode::Global)
    }
}

/// Byte order of binary scatter files and grid buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum ByteOrderMode {
    /// Little-endian (x86 and ARM hosts that produce most NonLinLoc output)
    #[default]
    Little,
    /// Big-endian
    Big,
    /// Whatever this machine uses
    Native,
}

impl ByteOrderMode {
    /// Resolve `Native` to a concrete order
    pub fn resolve(&self) -> ByteOrderMode {
        match self {
            ByteOrderMode::Native if cfg!(target_endian = "big") => ByteOrderMode::Big,
            ByteOrderMode::Native => ByteOrderMode::Little,
            other => *other,
        }
    }
}

/// Configuration for a scatter-to-angle run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngleConfig {
    /// Geometry mode the grid query service operates in
    pub geometry_mode: GeometryMode,

    /// Byte order for scatter files and grid buffers
    pub byte_order: ByteOrderMode,

    /// Number of blocking workers resolving angles
    pub workers: usize,

    /// Scatter points resolved per worker task
    pub chunk_size: usize,

    /// Points between progress reports
    pub progress_interval: usize,

    /// Show a progress bar on stderr
    pub show_progress: bool,

    /// Whether output keeps the sample probabilities
    pub grid_sampling: GridSampling,
}

impl Default for AngleConfig {
    fn default() -> Self {
        Self {
            geometry_mode: GeometryMode::Rectangular,
            byte_order: ByteOrderMode::Little,
            workers: num_cpus::get().clamp(1, MAX_WORKERS),
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            show_progress: false,
            grid_sampling: GridSampling::Uniform,
        }
    }
}

impl AngleConfig {
    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Create configuration with a geometry mode
    pub fn with_geometry_mode(mut self, geometry_mode: GeometryMode) -> Self {
        self.geometry_mode = geometry_mode;
        self
    }

    /// Create configuration with a byte order
    pub fn with_byte_order(mut self, byte_order: ByteOrderMode) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set points per worker task
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set points between progress reports
    pub fn with_progress_interval(mut self, progress_interval: usize) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    /// Enable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Set the sampling mode written to the output
    pub fn with_grid_sampling(mut self, grid_sampling: GridSampling) -> Self {
        self.grid_sampling = grid_sampling;
        self
    }

    /// Validate settings for consistency
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::configuration(
                "Number of workers must be greater than 0",
            ));
        }

        if self.workers > MAX_WORKERS {
            return Err(Error::configuration(format!(
                "Number of workers cannot exceed {}",
                MAX_WORKERS
            )));
        }

        if self.chunk_size == 0 {
            return Err(Error::configuration("Chunk size must be greater than 0"));
        }

        if self.progress_interval == 0 {
            return Err(Error::configuration(
                "Progress interval must be greater than 0",
            ));
        }

        debug!(
            "Configuration validated: {:?} geometry, {:?} byte order, {} workers",
            self.geometry_mode, self.byte_order, self.workers
        );
        Ok(())
    }
}
