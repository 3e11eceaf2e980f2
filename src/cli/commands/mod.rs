//! Command implementations for the scatangle CLI
//!
//! Each command is implemented in its own module:
//! - `convert`: one scatter file to a `.scatangle` file
//! - `batch`: station discovery and conversion of a whole run directory
//! - `point`: station angles for a single location
//! - `stations`: station catalog report

pub mod batch;
pub mod convert;
pub mod point;
pub mod shared;
pub mod stations;

pub use shared::ProcessingStats;

use crate::Result;
use crate::cli::args::Commands;
use tokio_util::sync::CancellationToken;

/// Main command runner
pub async fn run(command: Commands, cancellation_token: CancellationToken) -> Result<ProcessingStats> {
    match command {
        Commands::Convert(convert_args) => {
            convert::run_convert(convert_args, cancellation_token).await
        }
        Commands::Batch(batch_args) => batch::run_batch(batch_args, cancellation_token).await,
        Commands::Point(point_args) => point::run_point(point_args, cancellation_token).await,
        Commands::Stations(stations_args) => stations::run_stations(stations_args).await,
    }
}
