//! ScheduleEntry - a `<start> <end>` tracking window
//!
//! Entries are handed to the engine verbatim; the engine interprets them.
//! The helpers here exist for callers that build or inspect entries.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Local timestamp format of a schedule window bound (`yyyy-MM-dd-HH:mm`)
pub const SCHEDULE_TIME_FORMAT: &str = "%Y-%m-%d-%H:%M";

/// One scheduler window: enable tracking at `start`, disable at `end`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleEntry(String);

impl ScheduleEntry {
    /// Wrap a raw entry without inspecting it
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Format a window from two local timestamps
    pub fn window(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self(format!(
            "{} {}",
            start.format(SCHEDULE_TIME_FORMAT),
            end.format(SCHEDULE_TIME_FORMAT)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the entry back into its `(start, end)` bounds
    ///
    /// # Errors
    /// - Entry is not two whitespace-separated timestamps
    /// - A timestamp does not match [`SCHEDULE_TIME_FORMAT`]
    /// - `end` is not after `start`
    pub fn parse_window(&self) -> Result<(NaiveDateTime, NaiveDateTime), ContractError> {
        let mut parts = self.0.split_whitespace();
        let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ContractError::invalid_schedule_entry(
                &self.0,
                "expected '<start> <end>'",
            ));
        };

        let start = parse_bound(&self.0, start)?;
        let end = parse_bound(&self.0, end)?;
        if end <= start {
            return Err(ContractError::invalid_schedule_entry(
                &self.0,
                "end must be after start",
            ));
        }
        Ok((start, end))
    }
}

fn parse_bound(entry: &str, bound: &str) -> Result<NaiveDateTime, ContractError> {
    NaiveDateTime::parse_from_str(bound, SCHEDULE_TIME_FORMAT).map_err(|e| {
        ContractError::invalid_schedule_entry(entry, format!("bad timestamp '{bound}': {e}"))
    })
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScheduleEntry {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ScheduleEntry {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ScheduleEntry {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl PartialEq<&str> for ScheduleEntry {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
