//! EngineState and engine request types
//!
//! The state is owned by the tracking engine; callers only ever hold snapshots.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConfigPatch, EngineConfig, ScheduleEntry};

/// Snapshot of engine state
///
/// Extends [`EngineConfig`] with the two lifecycle flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// Continuous tracking is active
    #[serde(default)]
    pub enabled: bool,

    /// Time-window scheduler is active
    #[serde(default)]
    pub scheduler_enabled: bool,

    #[serde(flatten)]
    pub config: EngineConfig,
}

impl EngineState {
    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.config.schedule
    }

    /// Copy with credentials removed
    pub fn redacted(&self) -> Self {
        let mut state = self.clone();
        state.config.authorization = None;
        state
    }

    /// Redacted JSON rendering for log output
    pub fn redacted_json(&self) -> String {
        serde_json::to_string(&self.redacted())
            .unwrap_or_else(|e| format!("<unserializable engine state: {e}>"))
    }
}

/// Arguments of the one-time engine `ready` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyRequest {
    /// Discard persisted configuration before applying `config`
    pub reset: bool,

    pub config: ConfigPatch,
}

impl ReadyRequest {
    /// Apply `config` on top of whatever the engine persisted
    pub fn preserving(config: ConfigPatch) -> Self {
        Self {
            reset: false,
            config,
        }
    }
}

/// Epoch-millisecond window into the engine diagnostic log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl LogQuery {
    /// The `window` ending at `now`
    pub fn last(window: Duration, now: DateTime<Utc>) -> Self {
        let end_ms = now.timestamp_millis();
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        Self {
            start_ms: end_ms.saturating_sub(window_ms),
            end_ms,
        }
    }

    /// Whether `timestamp_ms` falls inside the window (both bounds inclusive)
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        (self.start_ms..=self.end_ms).contains(&timestamp_ms)
    }

    pub fn span_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}
