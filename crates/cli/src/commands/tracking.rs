//! `start`, `stop` and `status` commands.

use anyhow::{Context, Result};
use contracts::EngineState;

use super::open_controller;
use crate::cli::{Cli, StatusArgs};

/// Execute the `start` command
pub async fn run_start(cli: &Cli) -> Result<()> {
    let controller = open_controller(cli)?;
    controller.start().await.context("Failed to start tracking")?;
    println!("✓ Tracking enabled");
    Ok(())
}

/// Execute the `stop` command
pub async fn run_stop(cli: &Cli) -> Result<()> {
    let controller = open_controller(cli)?;
    controller.stop().await.context("Failed to stop tracking")?;
    println!("✓ Tracking disabled");
    Ok(())
}

/// Execute the `status` command
pub async fn run_status(cli: &Cli, args: &StatusArgs) -> Result<()> {
    let controller = open_controller(cli)?;
    let state = controller
        .state()
        .await
        .context("Failed to read engine state")?
        .redacted();

    if args.json {
        let json =
            serde_json::to_string_pretty(&state).context("Failed to serialize engine state")?;
        println!("{}", json);
    } else {
        print_status(&state);
    }
    Ok(())
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn print_status(state: &EngineState) {
    println!("Tracking:  {}", on_off(state.enabled));
    println!("Scheduler: {}", on_off(state.scheduler_enabled));
    println!(
        "Upload:    {}",
        state.config.url.as_deref().unwrap_or("(not configured)")
    );

    if state.schedule().is_empty() {
        println!("\nSchedule: (empty)");
    } else {
        println!("\nSchedule:");
        for (i, entry) in state.schedule().iter().enumerate() {
            println!("  {}. {}", i + 1, entry);
        }
    }
}
