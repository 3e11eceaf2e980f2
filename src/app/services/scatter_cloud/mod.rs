//! Binary scatter cloud reading and writing
//!
//! NonLinLoc `.scat` files carry a location PDF as a list of samples:
//!
//! ```text
//! i32  nSamples
//! f32  pad0, pad1, pad2          (ignored)
//! nSamples x (f32 x, f32 y, f32 z, f32 p)
//! ```
//!
//! There is no magic number or version field, so the declared count is checked
//! against the file size before any sample is decoded.

use crate::app::models::ScatterPoint;
use crate::config::ByteOrderMode;
use crate::constants::{MAX_SCATTER_SAMPLES, SCATTER_HEADER_BYTES, SCATTER_RECORD_BYTES};
use crate::{Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Scatter samples in file order
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterCloud {
    /// Sample count declared in the file header
    count: usize,
    /// The three header values after the count
    padding: [f32; 3],
    points: Vec<ScatterPoint>,
    source_path: Option<PathBuf>,
}

impl ScatterCloud {
    /// Build an in-memory cloud, e.g. a single query point
    pub fn from_points(points: Vec<ScatterPoint>) -> Self {
        Self {
            count: points.len(),
            padding: [0.0; 3],
            points,
            source_path: None,
        }
    }

    /// Load and decode a scatter file
    ///
    /// # Errors
    /// * `Error::ScatterFormat` if the file is missing, shorter than its header,
    ///   or declares a negative or implausibly large sample count
    /// * `Error::TruncatedScatter` if it holds fewer samples than declared
    pub async fn load(path: &Path, byte_order: ByteOrderMode) -> Result<Self> {
        info!("Reading scatter file {}", path.display());

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::scatter_format(
                path.display().to_string(),
                format!("Cannot read scatter file: {}", e),
            )
        })?;

        let mut cloud = Self::from_bytes(&bytes, byte_order, &path.display().to_string())?;
        cloud.source_path = Some(path.to_path_buf());

        info!("Samples: {}", cloud.count);
        Ok(cloud)
    }

    /// Decode a scatter cloud from raw bytes
    pub fn from_bytes(bytes: &[u8], byte_order: ByteOrderMode, path: &str) -> Result<Self> {
        match byte_order.resolve() {
            ByteOrderMode::Big => decode::<BigEndian>(bytes, path),
            _ => decode::<LittleEndian>(bytes, path),
        }
    }

    /// Encode the cloud in scatter file layout
    pub fn to_bytes(&self, byte_order: ByteOrderMode) -> Result<Vec<u8>> {
        match byte_order.resolve() {
            ByteOrderMode::Big => encode::<BigEndian>(self),
            _ => encode::<LittleEndian>(self),
        }
    }

    /// Write the cloud to a scatter file
    pub async fn write(&self, path: &Path, byte_order: ByteOrderMode) -> Result<()> {
        let bytes = self.to_bytes(byte_order)?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| Error::output_write(path.display().to_string(), e.to_string()))?;
        debug!("Wrote {} samples to {}", self.count, path.display());
        Ok(())
    }

    /// Declared sample count
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ScatterPoint] {
        &self.points
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

fn decode<B: ByteOrder>(bytes: &[u8], path: &str) -> Result<ScatterCloud> {
    let total_bytes = bytes.len() as u64;
    if total_bytes < SCATTER_HEADER_BYTES {
        return Err(Error::scatter_format(
            path,
            format!(
                "File is {} bytes, too short for the {}-byte header",
                total_bytes, SCATTER_HEADER_BYTES
            ),
        ));
    }

    let mut cursor = Cursor::new(bytes);
    let declared = cursor.read_i32::<B>()?;

    if declared < 0 {
        return Err(Error::scatter_format(
            path,
            format!("Negative sample count {}", declared),
        ));
    }

    let declared = declared as usize;
    if declared > MAX_SCATTER_SAMPLES {
        return Err(Error::scatter_format(
            path,
            format!(
                "Implausible sample count {} (limit {})",
                declared, MAX_SCATTER_SAMPLES
            ),
        ));
    }

    let padding = [
        cursor.read_f32::<B>()?,
        cursor.read_f32::<B>()?,
        cursor.read_f32::<B>()?,
    ];

    let available = ((total_bytes - SCATTER_HEADER_BYTES) / SCATTER_RECORD_BYTES) as usize;
    if available < declared {
        return Err(Error::truncated_scatter(path, declared, available));
    }
    if available > declared {
        debug!(
            "Scatter file {} has {} trailing samples beyond the declared {}",
            path,
            available - declared,
            declared
        );
    }

    let mut points = Vec::with_capacity(declared);
    for _ in 0..declared {
        let x = cursor.read_f32::<B>()?;
        let y = cursor.read_f32::<B>()?;
        let z = cursor.read_f32::<B>()?;
        let p = cursor.read_f32::<B>()?;
        points.push(ScatterPoint::from_f32(x, y, z, p));
    }

    Ok(ScatterCloud {
        count: declared,
        padding,
        points,
        source_path: None,
    })
}

fn encode<B: ByteOrder>(cloud: &ScatterCloud) -> Result<Vec<u8>> {
    let count = i32::try_from(cloud.points.len()).map_err(|_| {
        Error::configuration(format!(
            "Cannot encode {} samples in a 32-bit count",
            cloud.points.len()
        ))
    })?;

    let mut bytes = Vec::with_capacity(
        (SCATTER_HEADER_BYTES + SCATTER_RECORD_BYTES * cloud.points.len() as u64) as usize,
    );
    bytes.write_i32::<B>(count)?;
    for value in cloud.padding {
        bytes.write_f32::<B>(value)?;
    }
    for point in &cloud.points {
        bytes.write_f32::<B>(point.x as f32)?;
        bytes.write_f32::<B>(point.y as f32)?;
        bytes.write_f32::<B>(point.z as f32)?;
        bytes.write_f32::<B>(point.p as f32)?;
    }

    Ok(bytes)
}
