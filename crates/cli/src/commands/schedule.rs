//! `schedule` command implementation.

use anyhow::{Context, Result};
use contracts::ScheduleEntry;
use tracing::info;

use super::open_controller;
use crate::cli::{AddArgs, Cli, ScheduleCommand};
use crate::error::{self, CliError};

/// Execute a `schedule` subcommand
pub async fn run_schedule(cli: &Cli, action: &ScheduleCommand) -> Result<()> {
    let controller = open_controller(cli)?;

    match action {
        ScheduleCommand::Start => {
            controller
                .start_schedule()
                .await
                .context("Failed to start scheduler")?;
            println!("✓ Scheduler enabled");
        }
        ScheduleCommand::Stop => {
            controller
                .stop_schedule()
                .await
                .context("Failed to stop scheduler")?;
            println!("✓ Scheduler disabled");
        }
        ScheduleCommand::Clear => {
            controller
                .clear_schedule()
                .await
                .context("Failed to clear schedule")?;
            println!("✓ Schedule cleared");
        }
        ScheduleCommand::Add(args) => {
            let entry = entry_from_args(args)?;
            info!(entry = %entry, "Adding schedule entry");
            let schedule = controller
                .add_schedule_item(entry)
                .await
                .context("Failed to add schedule entry")?;
            println!("✓ Schedule now has {} entries", schedule.len());
            for entry in &schedule {
                println!("  - {}", entry);
            }
        }
    }
    Ok(())
}

/// Raw entries pass through untouched; windows are formatted and checked
fn entry_from_args(args: &AddArgs) -> error::Result<ScheduleEntry> {
    match (&args.entry, args.from, args.to) {
        (Some(raw), _, _) => Ok(ScheduleEntry::new(raw.clone())),
        (None, Some(from), Some(to)) => {
            let entry = ScheduleEntry::window(from, to);
            entry.parse_window()?;
            Ok(entry)
        }
        _ => Err(CliError::MissingScheduleEntry),
    }
}
