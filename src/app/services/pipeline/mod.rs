//! Scatter-to-angle pipeline
//!
//! Loads the station catalog and the scatter cloud, resolves every sample's
//! station angles, and writes the `.scatangle` file.
//!
//! Resolution is split into fixed-size chunks run on blocking workers. Chunk
//! results are collected with an order-preserving buffered stream, so the
//! output is the same for any worker count.

pub mod progress;

pub use progress::ProgressReporter;

use crate::app::models::{AngleResultSet, ScatterPoint};
use crate::app::services::angle_resolver::AngleResolver;
use crate::app::services::angle_writer::{AngleScatterWriter, WriteStats};
use crate::app::services::grid_query::GridQueryService;
use crate::app::services::scatter_cloud::ScatterCloud;
use crate::app::services::station_catalog::{LoadStats, StationCatalog};
use crate::config::AngleConfig;
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of converting one scatter file
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub scatter_path: PathBuf,
    pub output_path: PathBuf,
    pub stations: usize,
    pub stations_dropped: usize,
    pub samples_declared: usize,
    pub samples_resolved: usize,
    /// Station angles reported with quality 0
    pub degenerate_angles: usize,
    pub bytes_written: u64,
    pub resolution_time: Duration,
    pub total_time: Duration,
}

/// Orchestrates catalog load, cloud load, resolution and write
pub struct Pipeline<Q: GridQueryService + 'static> {
    config: AngleConfig,
    grid_query: Arc<Q>,
}

impl<Q: GridQueryService + 'static> Pipeline<Q> {
    /// Create a pipeline, initializing the grid query service once
    pub fn new(config: AngleConfig, grid_query: Arc<Q>) -> Result<Self> {
        config.validate()?;
        grid_query.set_constants()?;

        Ok(Self { config, grid_query })
    }

    pub fn config(&self) -> &AngleConfig {
        &self.config
    }

    pub fn grid_query(&self) -> &Arc<Q> {
        &self.grid_query
    }

    /// Load a station catalog, warning about dropped stations
    pub async fn load_catalog(&self, station_path: &Path) -> Result<(Arc<StationCatalog>, LoadStats)> {
        let (catalog, load_stats) = StationCatalog::load(station_path).await?;

        if load_stats.has_dropped_stations() {
            warn!(
                "{} of {} stations dropped from {}",
                load_stats.stations_dropped(),
                load_stats.entries_parsed,
                station_path.display()
            );
        }
        if catalog.is_empty() {
            warn!(
                "No usable stations in {}, output will contain probabilities only",
                station_path.display()
            );
        }

        Ok((Arc::new(catalog), load_stats))
    }

    /// Convert one scatter file using the stations in `station_path`
    pub async fn run(
        &self,
        scatter_path: &Path,
        station_path: &Path,
        cancellation_token: &CancellationToken,
    ) -> Result<PipelineStats> {
        let (catalog, load_stats) = self.load_catalog(station_path).await?;
        let mut stats = self
            .run_with_catalog(catalog, scatter_path, cancellation_token)
            .await?;
        stats.stations_dropped = load_stats.stations_dropped();
        Ok(stats)
    }

    /// Convert one scatter file against an already loaded catalog
    pub async fn run_with_catalog(
        &self,
        catalog: Arc<StationCatalog>,
        scatter_path: &Path,
        cancellation_token: &CancellationToken,
    ) -> Result<PipelineStats> {
        let start_time = Instant::now();

        let cloud = ScatterCloud::load(scatter_path, self.config.byte_order).await?;

        let resolution_start = Instant::now();
        let results = self
            .resolve_cloud(Arc::clone(&catalog), cloud.points(), cancellation_token)
            .await?;
        let resolution_time = resolution_start.elapsed();

        if cancellation_token.is_cancelled() {
            return Err(Error::processing_interrupted(
                "Cancelled before writing output",
            ));
        }

        let degenerate_angles = results
            .iter()
            .flat_map(|sample| sample.angles.iter())
            .filter(|record| record.quality == 0)
            .count();
        if degenerate_angles > 0 {
            debug!(
                "{} station angles came back with zero quality",
                degenerate_angles
            );
        }

        let write_stats = self.write(results, scatter_path).await?;

        let stats = PipelineStats {
            scatter_path: scatter_path.to_path_buf(),
            output_path: write_stats.output_path,
            stations: catalog.len(),
            stations_dropped: 0,
            samples_declared: cloud.count(),
            samples_resolved: write_stats.samples_written,
            degenerate_angles,
            bytes_written: write_stats.bytes_written,
            resolution_time,
            total_time: start_time.elapsed(),
        };

        info!(
            "Converted {} samples x {} stations to {} in {:.2?}",
            stats.samples_resolved,
            stats.stations,
            stats.output_path.display(),
            stats.total_time
        );
        Ok(stats)
    }

    /// Resolve station angles for every point, in input order
    pub async fn resolve_cloud(
        &self,
        catalog: Arc<StationCatalog>,
        points: &[ScatterPoint],
        cancellation_token: &CancellationToken,
    ) -> Result<AngleResultSet> {
        let total = points.len();
        let resolver = AngleResolver::new(Arc::clone(&catalog), Arc::clone(&self.grid_query));
        let mut results = AngleResultSet::with_capacity(catalog.names(), total);

        let mut progress = ProgressReporter::new(total, self.config.progress_interval);
        if self.config.show_progress {
            progress.enable_progress_bar();
        }

        debug!(
            "Resolving {} samples in chunks of {} on {} workers",
            total, self.config.chunk_size, self.config.workers
        );

        let chunks: Vec<Vec<ScatterPoint>> = points
            .chunks(self.config.chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        let mut resolved_chunks = stream::iter(chunks)
            .map(|chunk| {
                let resolver = resolver.clone();
                task::spawn_blocking(move || {
                    chunk
                        .iter()
                        .map(|point| resolver.resolve(point))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .buffered(self.config.workers);

        while let Some(joined) = resolved_chunks.next().await {
            if cancellation_token.is_cancelled() {
                progress.finish_with_error("cancelled");
                return Err(Error::processing_interrupted(format!(
                    "Cancelled after {} of {} samples",
                    progress.resolved(),
                    total
                )));
            }

            let samples = match joined {
                Ok(Ok(samples)) => samples,
                Ok(Err(e)) => {
                    progress.finish_with_error(&e.to_string());
                    return Err(e);
                }
                Err(e) => {
                    progress.finish_with_error("worker failed");
                    return Err(Error::processing_interrupted(format!(
                        "Resolution worker failed: {}",
                        e
                    )));
                }
            };

            let count = samples.len();
            for sample in samples {
                results.push(sample)?;
            }
            progress.record(count);
        }

        progress.finish(&format!("Resolved {} samples", results.len()));
        Ok(results)
    }

    /// Write results next to the scatter file
    async fn write(&self, results: AngleResultSet, scatter_path: &Path) -> Result<WriteStats> {
        let writer = AngleScatterWriter::new(self.config.grid_sampling);
        let base = scatter_path.to_path_buf();

        task::spawn_blocking(move || writer.write(&results, &base))
            .await
            .map_err(|e| {
                Error::output_write(
                    scatter_path.display().to_string(),
                    format!("Writer task failed: {}", e),
                )
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{GridDimension, GridSampling, SourceLocation, Station};
    use crate::app::services::grid_query::mock::MockGridQuery;
    use crate::config::GeometryMode;

    fn catalog() -> Arc<StationCatalog> {
        let source = SourceLocation::new(0.0, 0.0, 0.0);
        Arc::new(StationCatalog::from_stations(
            vec![
                Station::new("A", "grids/A", GridDimension::TwoD, source, "A").unwrap(),
                Station::new("B", "grids/B", GridDimension::ThreeD, source, "B").unwrap(),
            ],
            "stations.txt",
        ))
    }

    fn points(n: usize) -> Vec<ScatterPoint> {
        (0..n)
            .map(|i| ScatterPoint::new(i as f64, i as f64 * 2.0, 5.0, 1.0 / (i + 1) as f64))
            .collect()
    }

    fn pipeline(workers: usize, chunk_size: usize) -> Pipeline<MockGridQuery> {
        let config = AngleConfig::default()
            .with_workers(workers)
            .with_chunk_size(chunk_size)
            .with_grid_sampling(GridSampling::Weighted);
        Pipeline::new(config, Arc::new(MockGridQuery::new(GeometryMode::Rectangular))).unwrap()
    }

    #[test]
    fn test_new_sets_constants_once() {
        let pipeline = pipeline(1, 10);
        assert_eq!(pipeline.grid_query().constants_set_count(), 1);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Pipeline::new(
            AngleConfig::default().with_workers(0),
            Arc::new(MockGridQuery::new(GeometryMode::Rectangular)),
        );
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_resolve_cloud_preserves_input_order() {
        let points = points(57);
        let results = pipeline(4, 5)
            .resolve_cloud(catalog(), &points, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 57);
        for (sample, point) in results.iter().zip(&points) {
            assert_eq!(sample.p, point.p);
            assert_eq!(sample.angles.len(), 2);
            // 3D station echoes y as azimuth
            assert_eq!(sample.angles[1].azimuth, point.y);
        }
    }

    #[tokio::test]
    async fn test_worker_count_does_not_change_results() {
        let points = points(33);
        let sequential = pipeline(1, 1)
            .resolve_cloud(catalog(), &points, &CancellationToken::new())
            .await
            .unwrap();
        let parallel = pipeline(8, 4)
            .resolve_cloud(catalog(), &points, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[tokio::test]
    async fn test_cancelled_resolution_is_interrupted() {
        let token = CancellationToken::new();
        token.cancel();

        let result = pipeline(2, 2)
            .resolve_cloud(catalog(), &points(10), &token)
            .await;
        assert!(matches!(result, Err(Error::ProcessingInterrupted { .. })));
    }

    #[tokio::test]
    async fn test_empty_cloud_resolves_to_empty_set() {
        let results = pipeline(2, 2)
            .resolve_cloud(catalog(), &[], &CancellationToken::new())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(results.station_names(), &["A".to_string(), "B".to_string()]);
    }
}
