//! Mock tracking engine
//!
//! In-memory engine for tests. Supports injected failures, transitions the
//! engine accepts but does not perform, and records every call.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{ConfigPatch, EngineConfig, EngineState, LogQuery, ReadyRequest};
use tracing::instrument;

use crate::engine::TrackingEngine;
use crate::error::{EngineError, EngineResult};

/// Mock engine configuration (failure injection)
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// `ready` returns an error
    pub fail_ready: bool,
    /// `set_config` returns an error
    pub fail_set_config: bool,
    /// `get_state` returns an error
    pub fail_get_state: bool,
    /// `start` succeeds but tracking stays disabled
    pub ignore_start: bool,
    /// `stop` succeeds but tracking stays enabled
    pub ignore_stop: bool,
    /// `start_schedule` succeeds but the scheduler stays disabled
    pub ignore_start_schedule: bool,
    /// `stop_schedule` succeeds but the scheduler stays enabled
    pub ignore_stop_schedule: bool,
    /// `get_log` returns an error
    pub fail_get_log: bool,
    /// `set_config` silently keeps the old schedule
    pub drop_schedule_writes: bool,
    /// Delay before `ready` completes
    pub ready_delay: Option<Duration>,
    /// Text returned by `get_log`
    pub diagnostic_log: String,
}

/// A recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Ready { reset: bool },
    SetConfig { fields: Vec<&'static str> },
    GetState,
    Start,
    Stop,
    StartSchedule,
    StopSchedule,
    GetLog(LogQuery),
}

impl EngineCall {
    /// Whether the call can change engine state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Ready { .. }
                | Self::SetConfig { .. }
                | Self::Start
                | Self::Stop
                | Self::StartSchedule
                | Self::StopSchedule
        )
    }
}

/// Mock tracking engine
pub struct MockEngine {
    /// Configuration (failure injection)
    config: MockConfig,
    /// Engine state, seeded with what a previous run "persisted"
    state: Mutex<EngineState>,
    /// Every call, in order
    calls: Mutex<Vec<EngineCall>>,
    /// Every patch passed to `ready` / `set_config`, in order
    patches: Mutex<Vec<ConfigPatch>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockEngine {
    /// Fresh engine with factory defaults
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Fresh engine with failure injection
    pub fn with_config(config: MockConfig) -> Self {
        Self::with_state(EngineState::default(), config)
    }

    /// Engine holding `state` from an earlier run
    pub fn with_state(state: EngineState, config: MockConfig) -> Self {
        Self {
            config,
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
        }
    }

    /// All recorded calls
    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls that can change state
    pub fn mutation_count(&self) -> usize {
        lock(&self.calls).iter().filter(|c| c.is_mutation()).count()
    }

    /// Number of `ready` calls
    pub fn ready_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, EngineCall::Ready { .. }))
            .count()
    }

    /// Windows requested through `get_log`
    pub fn log_queries(&self) -> Vec<LogQuery> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                EngineCall::GetLog(query) => Some(*query),
                _ => None,
            })
            .collect()
    }

    /// Patches received by `ready` and `set_config`
    pub fn patches(&self) -> Vec<ConfigPatch> {
        lock(&self.patches).clone()
    }

    /// Current engine state, bypassing call recording
    pub fn snapshot(&self) -> EngineState {
        lock(&self.state).clone()
    }

    /// Overwrite engine state, e.g. to simulate the scheduler firing
    pub fn set_snapshot(&self, state: EngineState) {
        *lock(&self.state) = state;
    }

    fn record(&self, call: EngineCall) {
        lock(&self.calls).push(call);
    }

    fn update(&self, mutate: impl FnOnce(&mut EngineState)) -> EngineState {
        let mut state = lock(&self.state);
        mutate(&mut state);
        state.clone()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingEngine for MockEngine {
    #[instrument(name = "mock_engine_ready", skip(self, request), fields(reset = request.reset))]
    async fn ready(&self, request: ReadyRequest) -> EngineResult<EngineState> {
        self.record(EngineCall::Ready {
            reset: request.reset,
        });
        lock(&self.patches).push(request.config.clone());

        if let Some(delay) = self.config.ready_delay {
            tokio::time::sleep(delay).await;
        }
        if self.config.fail_ready {
            return Err(EngineError::unavailable("mock failure"));
        }

        Ok(self.update(|state| {
            if request.reset {
                state.config = EngineConfig::default();
            }
            state.config.apply(&request.config);
        }))
    }

    #[instrument(name = "mock_engine_set_config", skip(self, patch))]
    async fn set_config(&self, patch: ConfigPatch) -> EngineResult<EngineState> {
        self.record(EngineCall::SetConfig {
            fields: patch.defined_fields(),
        });
        lock(&self.patches).push(patch.clone());

        if self.config.fail_set_config {
            return Err(EngineError::rejected("set_config", "mock failure"));
        }

        let drop_schedule = self.config.drop_schedule_writes;
        Ok(self.update(|state| {
            let kept = state.config.schedule.clone();
            state.config.apply(&patch);
            if drop_schedule {
                state.config.schedule = kept;
            }
        }))
    }

    #[instrument(name = "mock_engine_get_state", skip(self))]
    async fn get_state(&self) -> EngineResult<EngineState> {
        self.record(EngineCall::GetState);
        if self.config.fail_get_state {
            return Err(EngineError::unavailable("mock failure"));
        }
        Ok(self.snapshot())
    }

    #[instrument(name = "mock_engine_start", skip(self))]
    async fn start(&self) -> EngineResult<EngineState> {
        self.record(EngineCall::Start);
        let ignore = self.config.ignore_start;
        Ok(self.update(|state| {
            if !ignore {
                state.enabled = true;
            }
        }))
    }

    #[instrument(name = "mock_engine_stop", skip(self))]
    async fn stop(&self) -> EngineResult<EngineState> {
        self.record(EngineCall::Stop);
        let ignore = self.config.ignore_stop;
        Ok(self.update(|state| {
            if !ignore {
                state.enabled = false;
            }
        }))
    }

    #[instrument(name = "mock_engine_start_schedule", skip(self))]
    async fn start_schedule(&self) -> EngineResult<EngineState> {
        self.record(EngineCall::StartSchedule);
        let ignore = self.config.ignore_start_schedule;
        Ok(self.update(|state| {
            if !ignore {
                state.scheduler_enabled = true;
            }
        }))
    }

    #[instrument(name = "mock_engine_stop_schedule", skip(self))]
    async fn stop_schedule(&self) -> EngineResult<EngineState> {
        self.record(EngineCall::StopSchedule);
        let ignore = self.config.ignore_stop_schedule;
        Ok(self.update(|state| {
            if !ignore {
                state.scheduler_enabled = false;
                state.enabled = false;
            }
        }))
    }

    #[instrument(name = "mock_engine_get_log", skip(self), fields(start_ms = query.start_ms, end_ms = query.end_ms))]
    async fn get_log(&self, query: LogQuery) -> EngineResult<String> {
        self.record(EngineCall::GetLog(query));
        if self.config.fail_get_log {
            return Err(EngineError::unavailable("mock failure"));
        }
        Ok(self.config.diagnostic_log.clone())
    }
}
