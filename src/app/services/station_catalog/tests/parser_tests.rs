//! Tests for station line and grid header parsing

use super::*;
use crate::Error;
use crate::app::models::GridDimension;
use crate::app::services::station_catalog::parser::{
    parse_grid_header, parse_station_file, parse_station_line,
};
use std::path::Path;

#[test]
fn test_parse_station_line_basic() {
    let entry = parse_station_line("ABC:root/path;ignored").unwrap();
    assert_eq!(entry.name, "ABC");
    assert_eq!(entry.grid_root, "root/path");
}

#[test]
fn test_parse_station_line_variants() {
    // Trailing newline and carriage return
    let entry = parse_station_line("S0271:time/grid.P.S0271.angle;\r\n").unwrap();
    assert_eq!(entry.name, "S0271");
    assert_eq!(entry.grid_root, "time/grid.P.S0271.angle");

    // No terminator: rest of the line is the root
    let entry = parse_station_line("XYZ:some/root").unwrap();
    assert_eq!(entry.grid_root, "some/root");

    // Empty name is skipped
    assert!(parse_station_line(":root/path;").is_none());

    // No separator is skipped
    assert!(parse_station_line("just some text").is_none());
}

#[test]
fn test_station_entry_round_trip_line() {
    let entry = parse_station_line("ABC:root/path;").unwrap();
    assert_eq!(entry.to_line(), "ABC:root/path;");
    assert_eq!(entry.header_path().to_string_lossy(), "root/path.hdr");
}

#[test]
fn test_parse_station_file_counts_skipped_lines() {
    let content = "A:root/a;\n\nnot-a-station\n:empty;\nB:root/b;trailing\n";
    let (entries, skipped) = parse_station_file(content);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "A");
    assert_eq!(entries[1].name, "B");
    assert_eq!(entries[1].grid_root, "root/b");
    assert_eq!(skipped, 2);
}

#[test]
fn test_parse_2d_header() {
    let content = two_d_header("STA01", 10.0, 20.0, -0.5);
    let header = parse_grid_header(&content, Path::new("sta01.hdr")).unwrap();

    assert_eq!(header.numx, 1);
    assert_eq!(header.numy, 101);
    assert_eq!(header.numz, 51);
    // Zero x spacing is forced to 1.0 on single-column grids
    assert_eq!(header.dx, 1.0);
    assert_eq!(header.dimension(), GridDimension::TwoD);
    assert_eq!(header.source_label, "STA01");
    assert_eq!(header.source.x, 10.0);
    assert_eq!(header.source.y, 20.0);
    assert_eq!(header.source.z, -0.5);
}

#[test]
fn test_parse_3d_header() {
    let content = three_d_header("STA02", 1.5, -2.5, 0.0);
    let header = parse_grid_header(&content, Path::new("sta02.hdr")).unwrap();

    assert_eq!(header.dimension(), GridDimension::ThreeD);
    assert_eq!(header.node_count(), Some(21 * 21 * 11));
    assert_eq!(header.origx, -10.0);
    assert_eq!(header.dx, 1.0);
    assert_eq!(header.grid_type, "ANGLE");
    assert_eq!(header.float_type, "FLOAT");
}

#[test]
fn test_parse_header_ignores_transform_line() {
    let content = format!(
        "{}TRANSFORM  LAMBERT RefEllipsoid WGS-84  LatOrig 52.0  LongOrig 0.0\n",
        three_d_header("STA03", 0.0, 0.0, 0.0)
    );
    let header = parse_grid_header(&content, Path::new("sta03.hdr")).unwrap();
    assert_eq!(header.source_label, "STA03");
}

#[test]
fn test_parse_header_numx_one_keeps_other_spacings() {
    let content = "1 10 10  0.0 0.0 0.0  0.0 2.5 0.5 ANGLE2D FLOAT\nS 0 0 0\n";
    let header = parse_grid_header(content, Path::new("s.hdr")).unwrap();
    assert_eq!(header.dx, 1.0);
    assert_eq!(header.dy, 2.5);
    assert_eq!(header.dz, 0.5);
}

#[test]
fn test_parse_header_errors() {
    // Truncated: no source line
    let result = parse_grid_header(
        "1 10 10  0.0 0.0 0.0  0.0 1.0 1.0 ANGLE2D FLOAT\n",
        Path::new("bad.hdr"),
    );
    assert!(matches!(result, Err(Error::GridHeader { .. })));

    // Non-numeric count
    let result = parse_grid_header(
        "x 10 10  0.0 0.0 0.0  0.0 1.0 1.0 ANGLE2D FLOAT\nS 0 0 0\n",
        Path::new("bad.hdr"),
    );
    assert!(matches!(result, Err(Error::GridHeader { .. })));

    // Zero count
    let result = parse_grid_header(
        "0 10 10  0.0 0.0 0.0  0.0 1.0 1.0 ANGLE2D FLOAT\nS 0 0 0\n",
        Path::new("bad.hdr"),
    );
    assert!(result.is_err());
}

#[test]
fn test_parse_header_rejects_oversized_grid() {
    let content =
        "100000000 100000000 100000000  0.0 0.0 0.0  1.0 1.0 1.0 ANGLE FLOAT\nS 0 0 0\n";
    let result = parse_grid_header(content, Path::new("huge.hdr"));

    match result {
        Err(Error::GridHeader { path, message }) => {
            assert_eq!(path, "huge.hdr");
            assert!(message.contains("too large"));
        }
        other => panic!("Expected grid header error, got {:?}", other),
    }
}

#[test]
fn test_angle_2d_tag_is_case_insensitive() {
    let content = "1 10 10  0.0 0.0 0.0  0.0 1.0 1.0 angle2d FLOAT\nS 0 0 0\n";
    let header = parse_grid_header(content, Path::new("s.hdr")).unwrap();
    assert_eq!(header.dimension(), GridDimension::TwoD);

    // A 2D time grid is not an angle grid
    let content = "1 10 10  0.0 0.0 0.0  0.0 1.0 1.0 TIME2D FLOAT\nS 0 0 0\n";
    let header = parse_grid_header(content, Path::new("s.hdr")).unwrap();
    assert_eq!(header.dimension(), GridDimension::ThreeD);
}
