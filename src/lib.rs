//! scatangle library
//!
//! A Rust library for converting NonLinLoc location scatter clouds into
//! per-station ray take-off angle samples for focal mechanism inversion.
//!
//! This library provides tools for:
//! - Loading station catalogs and classifying their angle grids as 2D or 3D
//! - Reading binary `.scat` point clouds with strict length validation
//! - Resolving take-off angles for every scatter point at every station
//! - Writing the `.scatangle` text format consumed by sampling tools
//! - Batch discovery of stations and scatter files from NonLinLoc run trees

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod angle_resolver;
        pub mod angle_writer;
        pub mod discovery;
        pub mod grid_query;
        pub mod pipeline;
        pub mod scatter_cloud;
        pub mod station_catalog;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{
    AngleRecord, AngleResultSet, GridDimension, GridSampling, SampleAngles, ScatterPoint,
    SourceLocation, Station,
};
pub use config::AngleConfig;

/// Result type alias for scatangle
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for scatter-to-angle conversion
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Station definition file missing or malformed
    #[error("Station file error in '{path}': {message}")]
    StationFile { path: String, message: String },

    /// Grid header could not be parsed
    #[error("Grid header error in '{path}': {message}")]
    GridHeader { path: String, message: String },

    /// Scatter file layout error
    #[error("Scatter file format error in '{path}': {message}")]
    ScatterFormat { path: String, message: String },

    /// Scatter file ended before the declared number of samples
    #[error("Truncated scatter file '{path}': header declares {declared} samples, found {found}")]
    TruncatedScatter {
        path: String,
        declared: usize,
        found: usize,
    },

    /// Grid query service failure
    #[error("Grid query failed for '{grid_root}': {message}")]
    GridQuery { grid_root: String, message: String },

    /// Output file could not be written
    #[error("Failed to write output file '{path}': {message}")]
    OutputWrite { path: String, message: String },

    /// Batch control file missing or malformed
    #[error("Control file error in '{path}': {message}")]
    ControlFile { path: String, message: String },

    /// Station or scatter file discovery failed
    #[error("Discovery error: {message}")]
    Discovery { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Some scatter files of a batch failed to convert
    #[error("{failed} of {total} scatter files failed to convert")]
    BatchIncomplete { failed: usize, total: usize },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a station file error
    pub fn station_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StationFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a grid header error
    pub fn grid_header(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GridHeader {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a scatter format error
    pub fn scatter_format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScatterFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a truncated scatter error
    pub fn truncated_scatter(path: impl Into<String>, declared: usize, found: usize) -> Self {
        Self::TruncatedScatter {
            path: path.into(),
            declared,
            found,
        }
    }

    /// Create a grid query error
    pub fn grid_query(grid_root: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GridQuery {
            grid_root: grid_root.into(),
            message: message.into(),
        }
    }

    /// Create an output write error
    pub fn output_write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OutputWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a control file error
    pub fn control_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ControlFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a batch incomplete error
    pub fn batch_incomplete(failed: usize, total: usize) -> Self {
        Self::BatchIncomplete { failed, total }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Pipeline stage the error belongs to, used in CLI error reports
    pub fn stage(&self) -> &'static str {
        match self {
            Self::StationFile { .. } | Self::GridHeader { .. } => "station parse",
            Self::ScatterFormat { .. } | Self::TruncatedScatter { .. } => "scatter parse",
            Self::GridQuery { .. } => "angle resolution",
            Self::OutputWrite { .. } => "write",
            Self::ControlFile { .. } | Self::Discovery { .. } => "discovery",
            Self::Configuration { .. } => "configuration",
            Self::BatchIncomplete { .. } => "batch",
            Self::ProcessingInterrupted { .. } => "processing",
            Self::Io { .. } => "I/O",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<glob::PatternError> for Error {
    fn from(error: glob::PatternError) -> Self {
        Self::Discovery {
            message: format!("Invalid glob pattern: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_stage_labels() {
        assert_eq!(
            Error::station_file("stations.txt", "missing").stage(),
            "station parse"
        );
        assert_eq!(
            Error::truncated_scatter("loc.scat", 100, 10).stage(),
            "scatter parse"
        );
        assert_eq!(Error::output_write("loc.scatangle", "denied").stage(), "write");
        assert_eq!(Error::grid_query("grid", "no buffer").stage(), "angle resolution");
    }

    #[test]
    fn test_truncated_scatter_message() {
        let error = Error::truncated_scatter("loc.scat", 100, 10);
        let message = error.to_string();
        assert!(message.contains("100"));
        assert!(message.contains("10"));
    }
}
