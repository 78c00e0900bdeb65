//! # geotrack CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Baseline configuration loading and validation
//! - Tracking and schedule lifecycle commands
//! - Engine state inspection

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_schedule, run_start, run_status, run_stop, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.metrics_port,
        default_log_level: cli.log_level().to_string(),
        ignore_env: cli.quiet,
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "geotrack starting");

    let result = match &cli.command {
        Commands::Start => run_start(&cli).await,
        Commands::Stop => run_stop(&cli).await,
        Commands::Status(args) => run_status(&cli, args).await,
        Commands::Schedule { action } => run_schedule(&cli, action).await,
        Commands::Validate(args) => run_validate(&cli, args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
