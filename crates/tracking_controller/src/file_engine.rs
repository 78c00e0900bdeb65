//! FileEngine - tracking engine persisted to a JSON file
//!
//! Stands in for a platform engine on hosts without one. State, including the
//! schedule and lifecycle flags, survives process restarts. Commands are
//! applied immediately; no location sensing happens.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use contracts::{ConfigPatch, EngineConfig, EngineState, LogQuery, ReadyRequest};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::engine::TrackingEngine;
use crate::error::EngineResult;

/// Diagnostic lines kept in the state file
pub const DEFAULT_LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogLevel {
    Info,
    Warn,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogLine {
    timestamp_ms: i64,
    level: LogLevel,
    message: String,
}

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    state: EngineState,
    #[serde(default)]
    log: Vec<LogLine>,
}

impl Persisted {
    fn push_log(&mut self, level: LogLevel, message: impl Into<String>, capacity: usize) {
        self.log.push(LogLine {
            timestamp_ms: Utc::now().timestamp_millis(),
            level,
            message: message.into(),
        });
        if self.log.len() > capacity {
            let excess = self.log.len() - capacity;
            self.log.drain(..excess);
        }
    }
}

/// File-backed tracking engine
pub struct FileEngine {
    path: PathBuf,
    log_capacity: usize,
    /// Serializes load-modify-store on the state file
    io: Mutex<()>,
}

impl FileEngine {
    /// Engine persisted at `path`; the file is created on first write
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            io: Mutex::new(()),
        }
    }

    /// Limit the number of diagnostic lines kept
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> EngineResult<Persisted> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file, using factory defaults");
                Ok(Persisted::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, persisted: &Persisted) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(persisted)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    /// Load, mutate, store and return the resulting state
    async fn modify(
        &self,
        mutate: impl FnOnce(&mut Persisted, usize),
    ) -> EngineResult<EngineState> {
        let _io = self.io.lock().await;
        let mut persisted = self.load().await?;
        mutate(&mut persisted, self.log_capacity);
        self.store(&persisted).await?;
        Ok(persisted.state)
    }
}

fn format_line(line: &LogLine) -> String {
    let at = DateTime::<Utc>::from_timestamp_millis(line.timestamp_ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| line.timestamp_ms.to_string());
    format!("{at} {} {}", line.level.as_str(), line.message)
}

impl TrackingEngine for FileEngine {
    #[instrument(name = "file_engine_ready", skip(self, request), fields(reset = request.reset))]
    async fn ready(&self, request: ReadyRequest) -> EngineResult<EngineState> {
        self.modify(|p, cap| {
            if request.reset {
                p.state.config = EngineConfig::default();
                p.push_log(LogLevel::Info, "ready: persisted configuration discarded", cap);
            }
            p.state.config.apply(&request.config);
            p.push_log(
                LogLevel::Info,
                format!("ready: {} schedule entries", p.state.schedule().len()),
                cap,
            );
        })
        .await
    }

    #[instrument(name = "file_engine_set_config", skip(self, patch))]
    async fn set_config(&self, patch: ConfigPatch) -> EngineResult<EngineState> {
        self.modify(|p, cap| {
            p.state.config.apply(&patch);
            p.push_log(
                LogLevel::Info,
                format!("set_config: {}", patch.defined_fields().join(",")),
                cap,
            );
        })
        .await
    }

    #[instrument(name = "file_engine_get_state", skip(self))]
    async fn get_state(&self) -> EngineResult<EngineState> {
        let _io = self.io.lock().await;
        Ok(self.load().await?.state)
    }

    #[instrument(name = "file_engine_start", skip(self))]
    async fn start(&self) -> EngineResult<EngineState> {
        self.modify(|p, cap| {
            p.state.enabled = true;
            p.push_log(LogLevel::Info, "tracking started", cap);
        })
        .await
    }

    #[instrument(name = "file_engine_stop", skip(self))]
    async fn stop(&self) -> EngineResult<EngineState> {
        self.modify(|p, cap| {
            p.state.enabled = false;
            p.push_log(LogLevel::Info, "tracking stopped", cap);
        })
        .await
    }

    #[instrument(name = "file_engine_start_schedule", skip(self))]
    async fn start_schedule(&self) -> EngineResult<EngineState> {
        self.modify(|p, cap| {
            if p.state.schedule().is_empty() {
                p.push_log(LogLevel::Warn, "scheduler not started: schedule is empty", cap);
                return;
            }
            let invalid: Vec<String> = p
                .state
                .schedule()
                .iter()
                .filter_map(|entry| entry.parse_window().err())
                .map(|e| e.to_string())
                .collect();
            if !invalid.is_empty() {
                for reason in invalid {
                    p.push_log(LogLevel::Warn, format!("scheduler not started: {reason}"), cap);
                }
                return;
            }
            p.state.scheduler_enabled = true;
            p.push_log(
                LogLevel::Info,
                format!("scheduler started with {} entries", p.state.schedule().len()),
                cap,
            );
        })
        .await
    }

    #[instrument(name = "file_engine_stop_schedule", skip(self))]
    async fn stop_schedule(&self) -> EngineResult<EngineState> {
        self.modify(|p, cap| {
            p.state.scheduler_enabled = false;
            p.state.enabled = false;
            p.push_log(LogLevel::Info, "scheduler stopped", cap);
        })
        .await
    }

    #[instrument(name = "file_engine_get_log", skip(self), fields(start_ms = query.start_ms, end_ms = query.end_ms))]
    async fn get_log(&self, query: LogQuery) -> EngineResult<String> {
        let _io = self.io.lock().await;
        let persisted = self.load().await?;
        let lines: Vec<String> = persisted
            .log
            .iter()
            .filter(|line| query.contains(line.timestamp_ms))
            .map(format_line)
            .collect();
        Ok(lines.join("\n"))
    }
}
