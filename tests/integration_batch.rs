//! Integration tests for batch conversion of a NonLinLoc run tree

use byteorder::{LittleEndian, WriteBytesExt};
use scatangle::app::services::grid_query::nlloc::encode_angle_word;
use scatangle::app::services::scatter_cloud::ScatterCloud;
use scatangle::cli::args::{BatchArgs, RunOptions};
use scatangle::cli::commands::batch::run_batch;
use scatangle::config::ByteOrderMode;
use scatangle::{Error, ScatterPoint};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn write_uniform_grid(root: &Path, header: &str, node_count: usize, dip: f64) {
    let root = root.to_string_lossy();
    std::fs::write(format!("{}.hdr", root), header).unwrap();

    let [dip_word, azimuth_word] = encode_angle_word(30.0, dip, 9);
    let mut bytes = Vec::new();
    for _ in 0..node_count {
        bytes.write_u16::<LittleEndian>(dip_word).unwrap();
        bytes.write_u16::<LittleEndian>(azimuth_word).unwrap();
    }
    std::fs::write(format!("{}.buf", root), bytes).unwrap();
}

/// Grids for P and S phases under `time/layer`, scatter files under `loc/`
fn run_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("time")).unwrap();
    std::fs::create_dir(dir.path().join("loc")).unwrap();

    let header = "2 2 2  0.0 0.0 0.0  1.0 1.0 1.0 ANGLE FLOAT\nSRC 0.0 0.0 0.0\n";
    for (name, dip) in [("BBB", 20.0), ("AAA", 10.0)] {
        write_uniform_grid(
            &dir.path().join(format!("time/layer.P.{}.angle", name)),
            header,
            8,
            dip,
        );
    }
    write_uniform_grid(
        &dir.path().join("time/layer.S.CCC.angle"),
        header,
        8,
        50.0,
    );
    dir
}

fn write_control(dir: &Path, extra_lines: &str) -> std::path::PathBuf {
    let control = dir.join("run.ctrl");
    std::fs::write(
        &control,
        format!(
            "{}\n{}\n{}",
            dir.join("time/layer").display(),
            dir.join("loc/run").display(),
            extra_lines
        ),
    )
    .unwrap();
    control
}

async fn write_cloud(path: &Path, p: f64) {
    ScatterCloud::from_points(vec![ScatterPoint::new(0.0, 1.0, 1.0, p)])
        .write(path, ByteOrderMode::Little)
        .await
        .unwrap();
}

fn batch_args(control_file: std::path::PathBuf, grid: bool) -> BatchArgs {
    BatchArgs {
        control_file,
        grid,
        options: RunOptions {
            quiet: true,
            workers: Some(2),
            ..RunOptions::default()
        },
    }
}

#[tokio::test]
async fn test_batch_converts_pending_scatter_files() {
    let dir = run_tree();
    let control = write_control(dir.path(), "P\ntrue\n");

    write_cloud(&dir.path().join("loc/run.0001.scat"), 0.75).await;
    write_cloud(&dir.path().join("loc/run.0002.scat"), 0.5).await;
    write_cloud(&dir.path().join("loc/run.0003.scat"), 0.25).await;
    std::fs::write(dir.path().join("loc/run.0003.scatangle"), "done\n").unwrap();

    let stats = run_batch(batch_args(control, false), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.files_converted, 2);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.stations_loaded, 2);

    // Discovered stations are written sorted by header path, S phase excluded
    let station_file = std::fs::read_to_string(dir.path().join("time/stations.txt")).unwrap();
    let names: Vec<&str> = station_file
        .lines()
        .map(|line| line.split(':').next().unwrap())
        .collect();
    assert_eq!(names, vec!["AAA", "BBB"]);

    let output = std::fs::read_to_string(dir.path().join("loc/run.0001.scatangle")).unwrap();
    assert_eq!(output, "0.75\nAAA\t30\t10\nBBB\t30\t20\n\n");

    // Already converted file is untouched
    let existing = std::fs::read_to_string(dir.path().join("loc/run.0003.scatangle")).unwrap();
    assert_eq!(existing, "done\n");
}

#[tokio::test]
async fn test_batch_uses_grid_flag_without_control_sampling() {
    let dir = run_tree();
    let control = write_control(dir.path(), "");
    write_cloud(&dir.path().join("loc/run.0001.scat"), 0.75).await;

    run_batch(batch_args(control.clone(), false), CancellationToken::new())
        .await
        .unwrap();
    let output = std::fs::read_to_string(dir.path().join("loc/run.0001.scatangle")).unwrap();
    assert!(output.starts_with("1\n"));

    std::fs::remove_file(dir.path().join("loc/run.0001.scatangle")).unwrap();
    run_batch(batch_args(control, true), CancellationToken::new())
        .await
        .unwrap();
    let output = std::fs::read_to_string(dir.path().join("loc/run.0001.scatangle")).unwrap();
    assert!(output.starts_with("0.75\n"));
}

#[tokio::test]
async fn test_batch_continues_past_bad_scatter_file() {
    let dir = run_tree();
    let control = write_control(dir.path(), "P\nfalse\n");

    write_cloud(&dir.path().join("loc/run.0001.scat"), 0.5).await;
    std::fs::write(dir.path().join("loc/run.0002.scat"), [0u8; 7]).unwrap();
    write_cloud(&dir.path().join("loc/run.0003.scat"), 0.5).await;

    let result = run_batch(batch_args(control, false), CancellationToken::new()).await;

    match result {
        Err(Error::BatchIncomplete { failed, total }) => {
            assert_eq!(failed, 1);
            assert_eq!(total, 3);
        }
        other => panic!("Expected incomplete batch, got {:?}", other),
    }
    assert!(dir.path().join("loc/run.0001.scatangle").exists());
    assert!(!dir.path().join("loc/run.0002.scatangle").exists());
    assert!(dir.path().join("loc/run.0003.scatangle").exists());
}

#[tokio::test]
async fn test_batch_rejects_incomplete_control_file() {
    let dir = run_tree();
    let control = dir.path().join("run.ctrl");
    std::fs::write(&control, "time/layer\n").unwrap();

    let result = run_batch(batch_args(control, false), CancellationToken::new()).await;
    assert!(matches!(result, Err(Error::ControlFile { .. })));
}
