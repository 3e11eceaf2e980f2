use clap::{CommandFactory, Parser};
use scatangle::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    let command = match args.resolve_command() {
        Ok(Some(command)) => command,
        Ok(None) => {
            show_help_and_commands();
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error during {}: {}", error.stage(), error);
            process::exit(1);
        }
    };

    // Create async runtime and run the command with signal handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let cancellation_token = CancellationToken::new();

        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available; never resolve
                std::future::pending::<()>().await;
            }
            cancellation_token.cancel();
        };

        tokio::select! {
            result = commands::run(command, cancellation_token.clone()) => {
                result
            }
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                Err(scatangle::Error::processing_interrupted(
                    "Processing interrupted by user",
                ))
            }
        }
    });

    match result {
        Ok(_stats) => {
            // Stats have already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error during {}: {:#}", error.stage(), error);
            process::exit(1);
        }
    }
}

/// Show help information when neither a subcommand nor positional arguments are given
fn show_help_and_commands() {
    println!("scatangle - NonLinLoc scatter cloud to take-off angle converter");
    println!("===============================================================");
    println!();
    println!("Convert a NonLinLoc location scatter cloud into per-station ray take-off");
    println!("angle samples for focal mechanism and moment tensor inversion.");
    println!();
    println!("USAGE:");
    println!("    scatangle <SCATTER_FILE> <STATION_FILE> <GRID_SAMPLING>");
    println!("    scatangle <COMMAND> [OPTIONS]");
    println!();
    println!("EXAMPLES:");
    println!("    # Convert one scatter file, keeping sample probabilities:");
    println!("    scatangle loc/run.20200101.scat time/stations.txt 1");
    println!();
    println!("    # Convert every new scatter file of a run:");
    println!("    scatangle batch run.ctrl --grid");
    println!();
    println!("    # Angles at one location:");
    println!("    scatangle point 12.5 -3.0 8.0 --grid-path time/layer");
    println!();

    let mut command = Args::command();
    if command.print_help().is_err() {
        println!("For detailed help, use: scatangle --help");
    }
}
