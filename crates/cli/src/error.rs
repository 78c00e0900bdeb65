//! Error types for CLI operations.

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Schedule time argument does not match the schedule format
    #[error("Invalid schedule time '{value}': expected YYYY-MM-DD-HH:MM")]
    InvalidScheduleTime { value: String },

    /// Neither a raw entry nor a complete window was given
    #[error("Either --entry or both --from and --to are required")]
    MissingScheduleEntry,

    /// Schedule entry assembled from arguments is malformed
    #[error("Invalid schedule entry: {0}")]
    InvalidScheduleEntry(#[from] ContractError),
}

impl CliError {
    pub fn invalid_schedule_time(value: impl Into<String>) -> Self {
        Self::InvalidScheduleTime {
            value: value.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
