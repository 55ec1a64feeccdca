//! # Co-simulation Bridge CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - config and topology loading and validation
//! - bridge runs driven by a host trace
//! - graceful shutdown

mod bridge;
mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands, LogFormat};
use commands::{run_bridge, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_format = match cli.log_format {
        LogFormat::Json => observability::LogFormat::Json,
        LogFormat::Pretty => observability::LogFormat::Pretty,
        LogFormat::Compact => observability::LogFormat::Compact,
    };
    observability::init_with_config(ObservabilityConfig::from_verbosity(
        cli.verbose,
        cli.quiet,
        log_format,
    ))?;

    info!(version = env!("CARGO_PKG_VERSION"), "cosim-bridge starting");

    let result = match &cli.command {
        Commands::Run(args) => run_bridge(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
