//! NonLinLoc angle grid lookup
//!
//! An angle grid is a `ROOT.hdr` text header plus a `ROOT.buf` buffer of
//! `numx * numy * numz` four-byte nodes, x slowest and z fastest. Each node
//! holds two u16 words in file byte order:
//!
//! ```text
//! word 0: quality + 16 * round(10 * dip)
//! word 1: round(10 * azimuth)
//! ```
//!
//! Lookup is nearest-node. Points outside the grid give a zero-quality angle.

use super::geometry::{self, normalize_degrees};
use super::{GridQueryService, TakeOffAngle};
use crate::app::models::SourceLocation;
use crate::app::services::station_catalog::GridHeader;
use crate::app::services::station_catalog::header_path_for;
use crate::config::{ByteOrderMode, GeometryMode};
use crate::constants::{
    ANGLE_QUALITY_MODULUS, ANGLE_TENTHS_PER_DEGREE, GRID_BUFFER_EXTENSION, THREE_D_QUERY_SENTINEL,
};
use crate::{Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Pack an angle into a grid node, the way NonLinLoc writes it
pub fn encode_angle_word(azimuth: f64, dip: f64, quality: u16) -> [u16; 2] {
    let dip_tenths = (0.5 + ANGLE_TENTHS_PER_DEGREE * dip) as u16;
    let azimuth_tenths = (0.5 + ANGLE_TENTHS_PER_DEGREE * azimuth) as u16;
    [
        quality % ANGLE_QUALITY_MODULUS + ANGLE_QUALITY_MODULUS * dip_tenths,
        azimuth_tenths,
    ]
}

/// Unpack a grid node into degrees and quality
pub fn decode_angle_word(node: [u16; 2]) -> TakeOffAngle {
    let [dip_word, azimuth_word] = node;
    TakeOffAngle {
        azimuth: f64::from(azimuth_word) / ANGLE_TENTHS_PER_DEGREE,
        dip: f64::from(dip_word / ANGLE_QUALITY_MODULUS) / ANGLE_TENTHS_PER_DEGREE,
        quality: i32::from(dip_word % ANGLE_QUALITY_MODULUS),
    }
}

/// A decoded angle grid
#[derive(Debug, Clone)]
pub struct AngleGrid {
    header: GridHeader,
    nodes: Vec<[u16; 2]>,
}

impl AngleGrid {
    /// Read `ROOT.hdr` and `ROOT.buf`
    pub fn load(grid_root: &str, byte_order: ByteOrderMode) -> Result<Self> {
        let header = GridHeader::read(&header_path_for(grid_root))
            .map_err(|e| Error::grid_query(grid_root, e.to_string()))?;

        if !header.float_type.eq_ignore_ascii_case("FLOAT") {
            return Err(Error::grid_query(
                grid_root,
                format!(
                    "Unsupported grid float type '{}', angle grids are FLOAT",
                    header.float_type
                ),
            ));
        }

        let buffer_path = buffer_path_for(grid_root);
        let bytes = std::fs::read(&buffer_path).map_err(|e| {
            Error::grid_query(
                grid_root,
                format!("Cannot read grid buffer {}: {}", buffer_path.display(), e),
            )
        })?;

        let nodes = match byte_order.resolve() {
            ByteOrderMode::Big => decode_nodes::<BigEndian>(&bytes),
            _ => decode_nodes::<LittleEndian>(&bytes),
        };

        let grid = Self::from_parts(header, nodes)
            .map_err(|e| Error::grid_query(grid_root, e.to_string()))?;

        debug!(
            "Loaded angle grid {} ({}x{}x{})",
            grid_root, grid.header.numx, grid.header.numy, grid.header.numz
        );
        Ok(grid)
    }

    /// Build a grid from a header and its nodes
    pub fn from_parts(header: GridHeader, nodes: Vec<[u16; 2]>) -> Result<Self> {
        let expected = header
            .node_count()
            .ok_or_else(|| Error::configuration("Grid node count overflows"))?;
        if nodes.len() < expected {
            return Err(Error::configuration(format!(
                "Grid buffer holds {} nodes, header declares {}",
                nodes.len(),
                expected
            )));
        }
        Ok(Self { header, nodes })
    }

    /// Angle at the node nearest to `(x, y, z)`
    pub fn lookup(&self, x: f64, y: f64, z: f64) -> TakeOffAngle {
        match self.node_index(x, y, z) {
            Some(index) => decode_angle_word(self.nodes[index]),
            None => TakeOffAngle::degenerate(),
        }
    }

    fn node_index(&self, x: f64, y: f64, z: f64) -> Option<usize> {
        let h = &self.header;
        let ix = nearest(x, h.origx, h.dx, h.numx)?;
        let iy = nearest(y, h.origy, h.dy, h.numy)?;
        let iz = nearest(z, h.origz, h.dz, h.numz)?;
        Some((ix * h.numy + iy) * h.numz + iz)
    }
}

fn nearest(value: f64, origin: f64, spacing: f64, count: usize) -> Option<usize> {
    let position = ((value - origin) / spacing + 0.5).floor();
    if !position.is_finite() || position < 0.0 || position >= count as f64 {
        return None;
    }
    Some(position as usize)
}

fn decode_nodes<B: ByteOrder>(bytes: &[u8]) -> Vec<[u16; 2]> {
    bytes
        .chunks_exact(4)
        .map(|node| [B::read_u16(&node[0..2]), B::read_u16(&node[2..4])])
        .collect()
}

/// Grid buffer path for a grid root
pub fn buffer_path_for(grid_root: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", grid_root, GRID_BUFFER_EXTENSION))
}

/// Grid query service over NonLinLoc angle grids on disk
///
/// Grids are decoded on first use and kept for the life of the service.
pub struct NllocGridQuery {
    geometry: GeometryMode,
    byte_order: ByteOrderMode,
    grids: RwLock<HashMap<String, Arc<AngleGrid>>>,
}

impl NllocGridQuery {
    pub fn new(geometry: GeometryMode, byte_order: ByteOrderMode) -> Self {
        Self {
            geometry,
            byte_order,
            grids: RwLock::new(HashMap::new()),
        }
    }

    /// Number of grids decoded so far
    pub fn cached_grids(&self) -> usize {
        self.grids.read().map(|grids| grids.len()).unwrap_or(0)
    }

    /// Cached grid for `grid_root`, loading it on first use
    pub fn grid(&self, grid_root: &str) -> Result<Arc<AngleGrid>> {
        {
            let grids = self
                .grids
                .read()
                .map_err(|_| Error::grid_query(grid_root, "Grid cache lock poisoned"))?;
            if let Some(grid) = grids.get(grid_root) {
                return Ok(Arc::clone(grid));
            }
        }

        let grid = Arc::new(AngleGrid::load(grid_root, self.byte_order)?);

        let mut grids = self
            .grids
            .write()
            .map_err(|_| Error::grid_query(grid_root, "Grid cache lock poisoned"))?;
        Ok(Arc::clone(
            grids.entry(grid_root.to_string()).or_insert(grid),
        ))
    }
}

impl GridQueryService for NllocGridQuery {
    fn set_constants(&self) -> Result<()> {
        info!(
            "Grid query: {:?} geometry, {:?} byte order",
            self.geometry, self.byte_order
        );
        Ok(())
    }

    fn geometry_mode(&self) -> GeometryMode {
        self.geometry
    }

    fn epicentral_distance(&self, source: &SourceLocation, x: f64, y: f64) -> f64 {
        geometry::epicentral_distance(self.geometry, source, x, y)
    }

    fn epicentral_azimuth(&self, source: &SourceLocation, x: f64, y: f64) -> f64 {
        geometry::epicentral_azimuth(self.geometry, source, x, y)
    }

    fn query_take_off_angle(
        &self,
        grid_root: &str,
        coord1: f64,
        coord2: f64,
        z: f64,
        ref_azimuth: f64,
    ) -> Result<TakeOffAngle> {
        let grid = self.grid(grid_root)?;
        let mut angle = grid.lookup(coord1, coord2, z);

        // 2D grids store angles in the station's vertical plane
        if ref_azimuth > THREE_D_QUERY_SENTINEL && !angle.is_degenerate() {
            angle.azimuth = normalize_degrees(ref_azimuth + 180.0);
        }

        Ok(angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::path::Path;
    use tempfile::TempDir;

    /// Write a grid whose node angles come from `angle_at(ix, iy, iz)`
    fn write_grid(
        dir: &Path,
        name: &str,
        dims: (usize, usize, usize),
        header_line: &str,
        angle_at: impl Fn(usize, usize, usize) -> (f64, f64, u16),
    ) -> String {
        let root = dir.join(name).to_string_lossy().to_string();
        std::fs::write(
            format!("{}.hdr", root),
            format!("{}\n{} 0.0 0.0 0.0\n", header_line, name),
        )
        .unwrap();

        let mut bytes = Vec::new();
        for ix in 0..dims.0 {
            for iy in 0..dims.1 {
                for iz in 0..dims.2 {
                    let (azimuth, dip, quality) = angle_at(ix, iy, iz);
                    let [low, high] = encode_angle_word(azimuth, dip, quality);
                    bytes.write_u16::<LittleEndian>(low).unwrap();
                    bytes.write_u16::<LittleEndian>(high).unwrap();
                }
            }
        }
        std::fs::write(format!("{}.buf", root), bytes).unwrap();
        root
    }

    #[test]
    fn test_angle_word_encoding() {
        let node = encode_angle_word(231.1, 117.0, 9);
        assert_eq!(node[1], 2311);
        assert_eq!(node[0], 9 + 16 * 1170);

        let angle = decode_angle_word(node);
        assert!((angle.azimuth - 231.1).abs() < 1e-9);
        assert!((angle.dip - 117.0).abs() < 1e-9);
        assert_eq!(angle.quality, 9);
    }

    #[test]
    fn test_3d_lookup_nearest_node() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_grid(
            temp_dir.path(),
            "sta3d",
            (3, 3, 3),
            "3 3 3  0.0 0.0 0.0  1.0 1.0 1.0 ANGLE FLOAT",
            |ix, iy, iz| (ix as f64 * 10.0 + iy as f64, iz as f64 * 20.0, 7),
        );

        let service = NllocGridQuery::new(GeometryMode::Rectangular, ByteOrderMode::Little);
        let angle = service
            .query_take_off_angle(&root, 2.2, 0.9, 1.4, THREE_D_QUERY_SENTINEL)
            .unwrap();

        assert!((angle.azimuth - 21.0).abs() < 1e-9);
        assert!((angle.dip - 20.0).abs() < 1e-9);
        assert_eq!(angle.quality, 7);
    }

    #[test]
    fn test_outside_grid_is_degenerate() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_grid(
            temp_dir.path(),
            "small",
            (2, 2, 2),
            "2 2 2  0.0 0.0 0.0  1.0 1.0 1.0 ANGLE FLOAT",
            |_, _, _| (90.0, 45.0, 10),
        );

        let service = NllocGridQuery::new(GeometryMode::Rectangular, ByteOrderMode::Little);
        let angle = service
            .query_take_off_angle(&root, 50.0, 0.0, 0.0, THREE_D_QUERY_SENTINEL)
            .unwrap();
        assert!(angle.is_degenerate());

        let angle = service
            .query_take_off_angle(&root, -1.0, 0.0, 0.0, THREE_D_QUERY_SENTINEL)
            .unwrap();
        assert!(angle.is_degenerate());
    }

    #[test]
    fn test_2d_lookup_reports_back_azimuth() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_grid(
            temp_dir.path(),
            "sta2d",
            (1, 11, 5),
            "1 11 5  0.0 0.0 0.0  0.0 10.0 5.0 ANGLE2D FLOAT",
            |_, iy, _| (0.0, 90.0 + iy as f64, 5),
        );

        let service = NllocGridQuery::new(GeometryMode::Rectangular, ByteOrderMode::Little);
        let angle = service.query_take_off_angle(&root, 0.0, 30.0, 0.0, 45.0).unwrap();

        assert!((angle.azimuth - 225.0).abs() < 1e-9);
        assert!((angle.dip - 93.0).abs() < 1e-9);

        let angle = service.query_take_off_angle(&root, 0.0, 30.0, 0.0, 270.0).unwrap();
        assert!((angle.azimuth - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_grids_are_cached() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_grid(
            temp_dir.path(),
            "cached",
            (2, 2, 2),
            "2 2 2  0.0 0.0 0.0  1.0 1.0 1.0 ANGLE FLOAT",
            |_, _, _| (10.0, 10.0, 1),
        );

        let service = NllocGridQuery::new(GeometryMode::Rectangular, ByteOrderMode::Little);
        service.query_take_off_angle(&root, 0.0, 0.0, 0.0, -1.0).unwrap();
        service.query_take_off_angle(&root, 1.0, 1.0, 1.0, -1.0).unwrap();
        assert_eq!(service.cached_grids(), 1);

        // Buffer removed after first load; cache still answers
        std::fs::remove_file(format!("{}.buf", root)).unwrap();
        assert!(service.query_take_off_angle(&root, 0.0, 0.0, 0.0, -1.0).is_ok());
    }

    #[test]
    fn test_oversized_grid_header_is_query_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_grid(
            temp_dir.path(),
            "huge",
            (2, 2, 1),
            "100000000 100000000 100000000  0.0 0.0 0.0  1.0 1.0 1.0 ANGLE FLOAT",
            |_, _, _| (0.0, 0.0, 1),
        );

        let service = NllocGridQuery::new(GeometryMode::Rectangular, ByteOrderMode::Little);
        let result = service.query_take_off_angle(&root, 1.0, 1.0, 0.0, THREE_D_QUERY_SENTINEL);
        assert!(matches!(result, Err(Error::GridQuery { .. })));
    }

    #[test]
    fn test_missing_or_short_buffer_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_grid(
            temp_dir.path(),
            "short",
            (1, 1, 1),
            "2 2 2  0.0 0.0 0.0  1.0 1.0 1.0 ANGLE FLOAT",
            |_, _, _| (0.0, 0.0, 0),
        );

        let service = NllocGridQuery::new(GeometryMode::Rectangular, ByteOrderMode::Little);
        assert!(matches!(
            service.query_take_off_angle(&root, 0.0, 0.0, 0.0, -1.0),
            Err(Error::GridQuery { .. })
        ));

        let missing = temp_dir.path().join("none").to_string_lossy().to_string();
        assert!(service.query_take_off_angle(&missing, 0.0, 0.0, 0.0, -1.0).is_err());
    }
}
