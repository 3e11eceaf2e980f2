//! Application constants for scatangle
//!
//! This module contains file-format constants, geometry conversion factors
//! and default values used throughout the application.

// =============================================================================
// File Naming
// =============================================================================

/// Extension appended to a grid root to locate its header file
pub const GRID_HEADER_EXTENSION: &str = ".hdr";

/// Extension appended to a grid root to locate its binary buffer
pub const GRID_BUFFER_EXTENSION: &str = ".buf";

/// Literal suffix appended to the scatter filename to name the output
///
/// This is plain concatenation, so `loc.scat` becomes `loc.scatangle`.
pub const OUTPUT_SUFFIX: &str = "angle";

/// Extension of NonLinLoc scatter files
pub const SCATTER_EXTENSION: &str = "scat";

/// Marker in discovered angle header file names
pub const ANGLE_HEADER_SUFFIX: &str = ".angle.hdr";

/// Name of the station file written by batch discovery
pub const STATIONS_FILE_NAME: &str = "stations.txt";

/// Default seismic phase used for angle grid discovery
pub const DEFAULT_PHASE: &str = "P";

// =============================================================================
// Station File Syntax
// =============================================================================

/// Separator between station name and grid root
pub const STATION_NAME_SEPARATOR: char = ':';

/// Terminator after the grid root; anything after it is ignored
pub const STATION_ENTRY_TERMINATOR: char = ';';

// =============================================================================
// Grid Header Conventions
// =============================================================================

/// Grid type tag identifying a 2-D take-off angle grid
pub const GRID_TYPE_ANGLE_2D: &str = "ANGLE2D";

/// Grid type tag identifying a 3-D take-off angle grid
pub const GRID_TYPE_ANGLE_3D: &str = "ANGLE";

/// Spacing forced onto the x axis of single-column grids
pub const DEGENERATE_GRID_SPACING: f64 = 1.0;

// =============================================================================
// Geometry
// =============================================================================

/// Kilometres per degree of great-circle arc
pub const DEG2KM: f64 = 111.194_926_644_558_73;

/// Degrees of great-circle arc per kilometre
pub const KM2DEG: f64 = 1.0 / DEG2KM;

/// Reference azimuth passed to the grid query for true 3-D lookups
pub const THREE_D_QUERY_SENTINEL: f64 = -1.0;

// =============================================================================
// Scatter File Layout
// =============================================================================

/// Bytes before the first sample: i32 count plus three f32 padding values
pub const SCATTER_HEADER_BYTES: u64 = 16;

/// Bytes per sample: four f32 values (x, y, z, p)
pub const SCATTER_RECORD_BYTES: u64 = 16;

/// Upper bound on the declared sample count accepted from a scatter header
pub const MAX_SCATTER_SAMPLES: usize = 50_000_000;

// =============================================================================
// Take-off Angle Encoding
// =============================================================================

/// Angle values are stored in tenths of a degree
pub const ANGLE_TENTHS_PER_DEGREE: f64 = 10.0;

/// Quality occupies the low four bits of the packed dip field
pub const ANGLE_QUALITY_MODULUS: u16 = 16;

// =============================================================================
// Processing Defaults
// =============================================================================

/// Points between progress reports
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Points resolved per blocking task
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Upper bound on resolution workers
pub const MAX_WORKERS: usize = 256;

/// Significant digits used when formatting output numbers
pub const OUTPUT_SIGNIFICANT_DIGITS: usize = 6;

/// Unix mode of written `.scatangle` files
pub const OUTPUT_FILE_MODE: u32 = 0o644;

/// Environment variable overriding the log filter
pub const LOG_ENV_VAR: &str = "SCATANGLE_LOG";
