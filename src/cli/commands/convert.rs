//! Convert command: one scatter file against one station file

use super::shared::{ProcessingStats, build_pipeline, print_summary, setup_logging};
use crate::cli::args::ConvertArgs;
use crate::Result;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Convert command runner
pub async fn run_convert(
    args: ConvertArgs,
    cancellation_token: CancellationToken,
) -> Result<ProcessingStats> {
    let start_time = Instant::now();

    setup_logging(&args.options)?;
    debug!("Convert arguments: {:?}", args);

    args.validate()?;
    let config = args.options.to_config(args.get_grid_sampling()?);

    info!(
        "Converting {} with stations from {}",
        args.scatter_file.display(),
        args.station_file.display()
    );

    let pipeline = build_pipeline(config)?;
    let run = pipeline
        .run(&args.scatter_file, &args.station_file, &cancellation_token)
        .await?;

    let mut stats = ProcessingStats {
        stations_dropped: run.stations_dropped,
        ..ProcessingStats::default()
    };
    stats.record_run(&run);
    stats.processing_time = start_time.elapsed();

    if !args.options.quiet {
        print_summary("Conversion complete", &stats);
    }

    Ok(stats)
}
