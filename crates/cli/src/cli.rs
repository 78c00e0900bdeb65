//! CLI argument definitions using clap.

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::SCHEDULE_TIME_FORMAT;
use std::path::PathBuf;

use crate::error::CliError;

/// geotrack - location tracking session controller
#[derive(Parser, Debug)]
#[command(
    name = "geotrack",
    author,
    version,
    about = "Location tracking session controller",
    long_about = "Drives a location tracking engine: starts and stops continuous tracking,\n\
                  manages the time-window schedule and verifies every state change.\n\n\
                  Engine state is persisted to a local state file."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "GEOTRACK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "GEOTRACK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Baseline configuration file (TOML or JSON); defaults apply when missing
    #[arg(
        short,
        long,
        default_value = "geotrack.toml",
        global = true,
        env = "GEOTRACK_CONFIG"
    )]
    pub config: PathBuf,

    /// Engine state file
    #[arg(
        long,
        default_value = ".geotrack/state.json",
        global = true,
        env = "GEOTRACK_STATE_FILE"
    )]
    pub state_file: PathBuf,

    /// Serve Prometheus metrics on this port
    #[arg(long, global = true, env = "GEOTRACK_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level derived from -v / -q
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start continuous tracking
    Start,

    /// Stop continuous tracking
    Stop,

    /// Show engine state
    Status(StatusArgs),

    /// Manage the tracking schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleCommand,
    },

    /// Validate the configuration file without touching the engine
    Validate(ValidateArgs),
}

/// Schedule subcommands
#[derive(Subcommand, Debug)]
pub enum ScheduleCommand {
    /// Start the time-window scheduler
    Start,

    /// Stop the time-window scheduler
    Stop,

    /// Remove every schedule entry
    Clear,

    /// Append a schedule entry
    Add(AddArgs),
}

/// Arguments for the `schedule add` command
#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Raw entry, e.g. "2024-01-01-09:00 2024-01-01-17:00"
    #[arg(long, conflicts_with_all = ["from", "to"], required_unless_present = "from")]
    pub entry: Option<String>,

    /// Window start (YYYY-MM-DD-HH:MM)
    #[arg(long, requires = "to", value_parser = parse_schedule_time)]
    pub from: Option<NaiveDateTime>,

    /// Window end (YYYY-MM-DD-HH:MM)
    #[arg(long, requires = "from", value_parser = parse_schedule_time)]
    pub to: Option<NaiveDateTime>,
}

/// Arguments for the `status` command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON (credentials redacted)
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

fn parse_schedule_time(value: &str) -> Result<NaiveDateTime, CliError> {
    NaiveDateTime::parse_from_str(value, SCHEDULE_TIME_FORMAT)
        .map_err(|_| CliError::invalid_schedule_time(value))
}
