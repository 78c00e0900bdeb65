//! Command implementations.

mod schedule;
mod tracking;
mod validate;

pub use schedule::run_schedule;
pub use tracking::{run_start, run_status, run_stop};
pub use validate::run_validate;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracking_controller::{FileEngine, TrackingController};

use crate::cli::Cli;

/// Controller over the file-backed engine named on the command line
pub(crate) fn open_controller(cli: &Cli) -> Result<TrackingController<FileEngine>> {
    let (baseline, from_file) = config_loader::ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    if from_file {
        info!(config = %cli.config.display(), "Baseline configuration loaded");
    } else {
        warn!(config = %cli.config.display(), "Config file not found, using defaults");
    }

    let engine = FileEngine::open(&cli.state_file);
    info!(state_file = %cli.state_file.display(), "Using file engine");
    Ok(TrackingController::new(engine, baseline))
}
