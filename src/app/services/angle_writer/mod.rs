//! `.scatangle` text output
//!
//! One block per scatter sample:
//!
//! ```text
//! <p, or 1 for uniform sampling>
//! <station>\t<azimuth>\t<dip>      (one line per station, catalog order)
//! <blank line>
//! ```
//!
//! Numbers use `%g`-style formatting with six significant digits so output
//! matches files produced by existing NonLinLoc tooling.

use crate::app::models::{AngleResultSet, GridSampling, SampleAngles};
#[cfg(unix)]
use crate::constants::OUTPUT_FILE_MODE;
use crate::constants::{OUTPUT_SIGNIFICANT_DIGITS, OUTPUT_SUFFIX};
use crate::{Error, Result};
use std::ffi::OsString;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Statistics for one written output file
#[derive(Debug, Clone, Default)]
pub struct WriteStats {
    pub output_path: PathBuf,
    pub samples_written: usize,
    pub stations_per_sample: usize,
    pub bytes_written: u64,
    pub write_duration: Duration,
}

/// Output path for a scatter file: the input name with `angle` appended
///
/// `loc.scat` becomes `loc.scatangle`.
pub fn output_path_for(base: &Path) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// Format a number like a default C++ stream: `%g` with six significant digits
pub fn format_significant(value: f64) -> String {
    format_with_precision(value, OUTPUT_SIGNIFICANT_DIGITS)
}

fn format_with_precision(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);

    // Exponent after rounding to the requested significant digits
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_trailing_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Serializes angle result sets
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleScatterWriter {
    grid_sampling: GridSampling,
}

impl AngleScatterWriter {
    pub fn new(grid_sampling: GridSampling) -> Self {
        Self { grid_sampling }
    }

    pub fn grid_sampling(&self) -> GridSampling {
        self.grid_sampling
    }

    /// Station lines of one sample, without the probability line
    pub fn station_lines(sample: &SampleAngles) -> String {
        sample
            .angles
            .iter()
            .map(|record| {
                format!(
                    "{}\t{}\t{}\n",
                    record.station_name,
                    format_significant(record.azimuth),
                    format_significant(record.dip)
                )
            })
            .collect()
    }

    /// Write all sample blocks to `writer`
    pub fn write_to<W: Write>(&self, results: &AngleResultSet, writer: &mut W) -> std::io::Result<()> {
        for sample in results {
            if self.grid_sampling.is_weighted() {
                writeln!(writer, "{}", format_significant(sample.p))?;
            } else {
                writeln!(writer, "1")?;
            }
            writer.write_all(Self::station_lines(sample).as_bytes())?;
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Render the whole output in memory
    pub fn render(&self, results: &AngleResultSet) -> String {
        let mut buffer = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_to(results, &mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Write `<base>angle`, replacing any existing file
    ///
    /// Output goes to a temporary file in the same directory first, so a failed
    /// write leaves no partial file behind.
    pub fn write(&self, results: &AngleResultSet, base: &Path) -> Result<WriteStats> {
        let start_time = Instant::now();
        let output_path = output_path_for(base);
        let output_display = output_path.display().to_string();

        info!("Writing angle scatter file {}", output_display);

        let directory = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let temp_file = NamedTempFile::new_in(&directory)
            .map_err(|e| Error::output_write(&output_display, e.to_string()))?;
        set_output_permissions(&temp_file)
            .map_err(|e| Error::output_write(&output_display, e.to_string()))?;

        let mut writer = BufWriter::new(temp_file);
        self.write_to(results, &mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::output_write(&output_display, e.to_string()))?;

        let temp_file = writer
            .into_inner()
            .map_err(|e| Error::output_write(&output_display, e.to_string()))?;
        let file = temp_file
            .persist(&output_path)
            .map_err(|e| Error::output_write(&output_display, e.to_string()))?;

        let bytes_written = file.metadata().map(|m| m.len()).unwrap_or(0);

        let stats = WriteStats {
            output_path,
            samples_written: results.len(),
            stations_per_sample: results.station_names().len(),
            bytes_written,
            write_duration: start_time.elapsed(),
        };

        debug!(
            "Wrote {} samples x {} stations ({} bytes) in {:.2?}",
            stats.samples_written, stats.stations_per_sample, stats.bytes_written, stats.write_duration
        );
        Ok(stats)
    }
}

/// Temporary files are created owner-only; give the output the usual mode
#[cfg(unix)]
fn set_output_permissions(temp_file: &NamedTempFile) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    temp_file
        .as_file()
        .set_permissions(std::fs::Permissions::from_mode(OUTPUT_FILE_MODE))
}

#[cfg(not(unix))]
fn set_output_permissions(_temp_file: &NamedTempFile) -> std::io::Result<()> {
    Ok(())
}
