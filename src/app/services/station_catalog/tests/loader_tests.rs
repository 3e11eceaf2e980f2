//! Tests for station catalog loading

use super::*;
use crate::Error;
use crate::app::models::GridDimension;
use crate::app::services::station_catalog::StationCatalog;
use tempfile::TempDir;

#[tokio::test]
async fn test_load_catalog_preserves_file_order() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    let root_b = write_header(dir, "grid.P.B.angle", &three_d_header("B", 1.0, 1.0, 0.0)).unwrap();
    let root_a = write_header(dir, "grid.P.A.angle", &two_d_header("A", 0.0, 0.0, 0.0)).unwrap();
    let root_c = write_header(dir, "grid.P.C.angle", &two_d_header("C", 5.0, 5.0, 0.0)).unwrap();

    let station_file = write_station_file(
        dir,
        &[
            ("B", root_b.as_str()),
            ("A", root_a.as_str()),
            ("C", root_c.as_str()),
        ],
    )
    .unwrap();

    let (catalog, stats) = StationCatalog::load(&station_file).await.unwrap();

    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.names(), vec!["B", "A", "C"]);
    assert_eq!(catalog.get(0).unwrap().dimension(), GridDimension::ThreeD);
    assert_eq!(catalog.get(1).unwrap().dimension(), GridDimension::TwoD);
    assert_eq!(catalog.count_by_dimension(GridDimension::TwoD), 2);

    assert_eq!(stats.entries_parsed, 3);
    assert_eq!(stats.stations_loaded, 3);
    assert_eq!(stats.stations_2d, 2);
    assert_eq!(stats.stations_3d, 1);
    assert!(!stats.has_dropped_stations());
}

#[tokio::test]
async fn test_missing_header_drops_station() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    let root_a = write_header(dir, "grid.P.A.angle", &two_d_header("A", 0.0, 0.0, 0.0)).unwrap();
    let missing_root = dir.join("grid.P.MISSING.angle").to_string_lossy().to_string();
    let root_c = write_header(dir, "grid.P.C.angle", &three_d_header("C", 0.0, 0.0, 0.0)).unwrap();

    let station_file = write_station_file(
        dir,
        &[
            ("A", root_a.as_str()),
            ("MISSING", missing_root.as_str()),
            ("C", root_c.as_str()),
        ],
    )
    .unwrap();

    let (catalog, stats) = StationCatalog::load(&station_file).await.unwrap();

    assert_eq!(catalog.names(), vec!["A", "C"]);
    assert!(catalog.find("MISSING").is_none());
    assert_eq!(stats.stations_dropped(), 1);
    assert_eq!(stats.missing_headers.len(), 1);
    assert!(
        stats.missing_headers[0]
            .to_string_lossy()
            .ends_with("grid.P.MISSING.angle.hdr")
    );
}

#[tokio::test]
async fn test_malformed_header_drops_station() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    let root_ok = write_header(dir, "ok", &three_d_header("OK", 0.0, 0.0, 0.0)).unwrap();
    let root_bad = write_header(dir, "bad", "1 2 3 garbage\n").unwrap();

    let station_file =
        write_station_file(dir, &[("OK", root_ok.as_str()), ("BAD", root_bad.as_str())])
            .unwrap();

    let (catalog, stats) = StationCatalog::load(&station_file).await.unwrap();

    assert_eq!(catalog.names(), vec!["OK"]);
    assert_eq!(stats.malformed_headers.len(), 1);
    assert!(stats.missing_headers.is_empty());
}

#[tokio::test]
async fn test_missing_station_file_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let result = StationCatalog::load(&temp_dir.path().join("nope.txt")).await;

    assert!(matches!(result, Err(Error::StationFile { .. })));
}

#[tokio::test]
async fn test_source_location_from_header() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    let root = write_header(dir, "s", &two_d_header("SRC", 12.5, -3.25, 0.1)).unwrap();
    let station_file = write_station_file(dir, &[("S", root.as_str())]).unwrap();

    let (catalog, _) = StationCatalog::load(&station_file).await.unwrap();
    let station = catalog.get(0).unwrap();

    assert_eq!(station.source().x, 12.5);
    assert_eq!(station.source().y, -3.25);
    assert_eq!(station.source().z, 0.1);
    assert_eq!(station.label(), "SRC");
    assert_eq!(station.grid_root(), root);
}

#[tokio::test]
async fn test_empty_station_file_gives_empty_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let station_file = write_station_file(temp_dir.path(), &[]).unwrap();

    let (catalog, stats) = StationCatalog::load(&station_file).await.unwrap();
    assert!(catalog.is_empty());
    assert_eq!(stats.entries_parsed, 0);
}
