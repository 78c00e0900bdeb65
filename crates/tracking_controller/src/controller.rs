//! TrackingController core implementation
//!
//! Idempotent lifecycle operations over a [`TrackingEngine`]. The engine is
//! the only source of truth: every operation re-reads state, mutates only when
//! the target state is not already reached, then reads state again to verify.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use contracts::{ConfigPatch, EngineState, InitConfig, LogQuery, ReadyRequest, ScheduleEntry};
use observability::{
    record_initialization, record_operation, record_schedule_entries, record_transition_failure,
    Outcome,
};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, instrument, warn};

use crate::engine::TrackingEngine;
use crate::error::{ControllerError, EngineError, InitStage, InitializationError, Result, Transition};

/// Diagnostic log window fetched when the scheduler fails to start
pub const DEFAULT_DIAGNOSTIC_WINDOW: Duration = Duration::from_secs(5 * 60);

type InitOutcome = std::result::Result<(), InitializationError>;

/// Tracking Controller
///
/// Owns the one-time engine initialization and exposes the tracking and
/// schedule lifecycle. Every operation awaits the shared initialization
/// outcome first; a failed initialization is replayed to every caller.
pub struct TrackingController<E: TrackingEngine> {
    engine: E,
    baseline: InitConfig,
    /// Single-shot initialization outcome, shared by all callers
    init: OnceCell<InitOutcome>,
    /// Serializes schedule read-modify-write sequences
    schedule_gate: Mutex<()>,
    diagnostic_window: Duration,
}

impl<E: TrackingEngine> TrackingController<E> {
    /// Create a controller; initialization runs on the first operation
    pub fn new(engine: E, baseline: InitConfig) -> Self {
        Self {
            engine,
            baseline,
            init: OnceCell::new(),
            schedule_gate: Mutex::new(()),
            diagnostic_window: DEFAULT_DIAGNOSTIC_WINDOW,
        }
    }

    /// Create a controller and drive initialization immediately
    ///
    /// Never fails: an initialization error is logged here and returned by
    /// every later operation instead.
    pub async fn connect(engine: E, baseline: InitConfig) -> Self {
        let controller = Self::new(engine, baseline);
        if let Err(e) = controller.initialize().await {
            warn!(error = %e, "initialization failed, operations will report it");
        }
        controller
    }

    /// Override the diagnostic log window
    pub fn with_diagnostic_window(mut self, window: Duration) -> Self {
        self.diagnostic_window = window;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Whether initialization completed successfully
    pub fn is_initialized(&self) -> bool {
        matches!(self.init.get(), Some(Ok(())))
    }

    /// Await the shared initialization outcome
    ///
    /// The first caller runs the initialization; concurrent and later callers
    /// receive the same cached result. Never retried.
    pub async fn initialize(&self) -> Result<()> {
        self.init
            .get_or_init(|| self.run_initialization())
            .await
            .clone()
            .map_err(ControllerError::from)
    }

    /// Start continuous tracking
    ///
    /// No-op when tracking is already enabled.
    ///
    /// # Errors
    /// - Initialization failed
    /// - Engine call failed
    /// - `Tracking Not Enabled` when the engine accepted the call but stayed disabled
    #[instrument(name = "tracking_controller_start", skip(self))]
    pub async fn start(&self) -> Result<()> {
        info!("start called");
        let started = Instant::now();
        let result = self.start_tracking().await.map(|outcome| ((), outcome));
        finish("start", started, result)
    }

    /// Stop continuous tracking
    ///
    /// No-op when tracking is already disabled.
    #[instrument(name = "tracking_controller_stop", skip(self))]
    pub async fn stop(&self) -> Result<()> {
        info!("stop called");
        let started = Instant::now();
        let result = self.stop_tracking().await.map(|outcome| ((), outcome));
        finish("stop", started, result)
    }

    /// Start the time-window scheduler
    ///
    /// No-op when the scheduler is already enabled. When the engine accepts
    /// the call but the scheduler stays disabled, the recent engine diagnostic
    /// log is emitted before `Scheduler Failed To Start` is returned.
    #[instrument(name = "tracking_controller_start_schedule", skip(self))]
    pub async fn start_schedule(&self) -> Result<()> {
        info!("start schedule called");
        let started = Instant::now();
        let result = self.start_scheduler().await.map(|outcome| ((), outcome));
        finish("start_schedule", started, result)
    }

    /// Stop the time-window scheduler
    ///
    /// No-op when the scheduler is already disabled.
    #[instrument(name = "tracking_controller_stop_schedule", skip(self))]
    pub async fn stop_schedule(&self) -> Result<()> {
        info!("stop schedule called");
        let started = Instant::now();
        let result = self.stop_scheduler().await.map(|outcome| ((), outcome));
        finish("stop_schedule", started, result)
    }

    /// Remove every schedule entry, returning the resulting (empty) schedule
    ///
    /// Writes nothing when the schedule is already empty.
    #[instrument(name = "tracking_controller_clear_schedule", skip(self))]
    pub async fn clear_schedule(&self) -> Result<Vec<ScheduleEntry>> {
        info!("clear schedule called");
        let started = Instant::now();
        let result = self.clear_schedule_entries().await;
        finish("clear_schedule", started, result)
    }

    /// Append `entry` to the schedule, returning the resulting schedule
    ///
    /// Not idempotent: the same entry added twice appears twice.
    #[instrument(name = "tracking_controller_add_schedule_item", skip(self, entry), fields(entry = %entry))]
    pub async fn add_schedule_item(&self, entry: ScheduleEntry) -> Result<Vec<ScheduleEntry>> {
        info!("add schedule called");
        let started = Instant::now();
        let result = self
            .append_schedule_entry(entry)
            .await
            .map(|schedule| (schedule, Outcome::Changed));
        finish("add_schedule_item", started, result)
    }

    /// Current engine state
    ///
    /// Contains credentials; use [`EngineState::redacted`] before printing.
    #[instrument(name = "tracking_controller_state", skip(self))]
    pub async fn state(&self) -> Result<EngineState> {
        info!("state called");
        let started = Instant::now();
        let result = self
            .read_state()
            .await
            .map(|state| (state, Outcome::Unchanged));
        finish("state", started, result)
    }
}

impl<E: TrackingEngine> TrackingController<E> {
    #[instrument(name = "tracking_controller_initialize", skip(self))]
    async fn run_initialization(&self) -> InitOutcome {
        let baseline = self.baseline.to_patch();

        info!("initialize => make ready");
        let ready_state = self
            .engine
            .ready(ReadyRequest::preserving(baseline.clone()))
            .await
            .map_err(|e| init_failure(InitStage::Ready, e))?;
        info!(
            state = %ready_state.redacted_json(),
            "engine ready, reapplying baseline configuration"
        );

        // Baseline wins for every field it defines; schedule and extras come
        // from the ready state untouched.
        let merged = ConfigPatch::from(&ready_state.config).overlay(&baseline);
        let applied = self
            .engine
            .set_config(merged)
            .await
            .map_err(|e| init_failure(InitStage::ApplyBaseline, e))?;
        info!(
            state = %applied.redacted_json(),
            "baseline configuration applied"
        );

        record_initialization(true);
        record_schedule_entries(applied.schedule().len());
        Ok(())
    }

    async fn read_state(&self) -> Result<EngineState> {
        self.initialize().await?;
        Ok(self.engine.get_state().await?)
    }

    async fn start_tracking(&self) -> Result<Outcome> {
        let state = self.read_state().await?;
        if state.enabled {
            debug!("tracking already enabled");
            return Ok(Outcome::Unchanged);
        }

        info!("start => start");
        self.engine.start().await?;
        self.verify(|s| s.enabled, Transition::TrackingNotEnabled)
            .await?;
        info!("tracking enabled");
        Ok(Outcome::Changed)
    }

    async fn stop_tracking(&self) -> Result<Outcome> {
        let state = self.read_state().await?;
        if !state.enabled {
            debug!("tracking already disabled");
            return Ok(Outcome::Unchanged);
        }

        info!("stop => stop");
        self.engine.stop().await?;
        self.verify(|s| !s.enabled, Transition::TrackingStillEnabled)
            .await?;
        info!("tracking disabled");
        Ok(Outcome::Changed)
    }

    async fn start_scheduler(&self) -> Result<Outcome> {
        let state = self.read_state().await?;
        if state.scheduler_enabled {
            debug!("scheduler already enabled");
            return Ok(Outcome::Unchanged);
        }

        info!(state = %state.redacted_json(), "starting schedule");
        let hint = self.engine.start_schedule().await?;
        debug!(state = %hint.redacted_json(), "engine answered start schedule");

        let state = self.engine.get_state().await?;
        info!(state = %state.redacted_json(), "schedule start requested");
        if !state.scheduler_enabled {
            self.dump_diagnostic_log().await;
            return Err(ControllerError::TransitionVerification(
                Transition::SchedulerFailedToStart,
            ));
        }
        Ok(Outcome::Changed)
    }

    async fn stop_scheduler(&self) -> Result<Outcome> {
        let state = self.read_state().await?;
        if !state.scheduler_enabled {
            debug!("scheduler already disabled");
            return Ok(Outcome::Unchanged);
        }

        info!("stop schedule => stop schedule");
        self.engine.stop_schedule().await?;
        self.verify(|s| !s.scheduler_enabled, Transition::SchedulerFailedToStop)
            .await?;
        info!("scheduler disabled");
        Ok(Outcome::Changed)
    }

    async fn clear_schedule_entries(&self) -> Result<(Vec<ScheduleEntry>, Outcome)> {
        self.initialize().await?;
        let _gate = self.schedule_gate.lock().await;

        let state = self.engine.get_state().await?;
        if state.schedule().is_empty() {
            debug!("schedule already empty");
            return Ok((Vec::new(), Outcome::Unchanged));
        }

        info!(entries = state.schedule().len(), "clearing schedule");
        let mut patch = ConfigPatch::from(&state.config);
        patch.schedule = Some(Vec::new());
        let schedule = self.write_schedule(patch).await?;
        Ok((schedule, Outcome::Changed))
    }

    async fn append_schedule_entry(&self, entry: ScheduleEntry) -> Result<Vec<ScheduleEntry>> {
        self.initialize().await?;
        let _gate = self.schedule_gate.lock().await;

        let state = self.engine.get_state().await?;
        let mut schedule = state.config.schedule.clone();
        info!(entry = %entry, existing = schedule.len(), "add schedule => adding");
        schedule.push(entry);

        // Full object round trip: every field read is written back as-is.
        let mut patch = ConfigPatch::from(&state.config);
        patch.schedule = Some(schedule);
        self.write_schedule(patch).await
    }

    /// Write a full patch and check the engine kept the schedule it was given
    async fn write_schedule(&self, patch: ConfigPatch) -> Result<Vec<ScheduleEntry>> {
        let expected = patch.schedule.clone().unwrap_or_default();
        let state = self.engine.set_config(patch).await?;

        if state.config.schedule != expected {
            warn!(
                expected = expected.len(),
                actual = state.schedule().len(),
                "engine did not persist schedule"
            );
            return Err(ControllerError::TransitionVerification(
                Transition::ScheduleNotPersisted,
            ));
        }

        record_schedule_entries(expected.len());
        Ok(state.config.schedule)
    }

    /// Re-read state and check `reached` holds
    async fn verify(
        &self,
        reached: impl FnOnce(&EngineState) -> bool,
        transition: Transition,
    ) -> Result<EngineState> {
        let state = self.engine.get_state().await?;
        if reached(&state) {
            Ok(state)
        } else {
            Err(ControllerError::TransitionVerification(transition))
        }
    }

    /// Emit the recent engine diagnostic log
    ///
    /// Scheduler start failures are platform specific and otherwise silent.
    async fn dump_diagnostic_log(&self) {
        let query = LogQuery::last(self.diagnostic_window, Utc::now());
        match self.engine.get_log(query).await {
            Ok(log) => warn!(
                start_ms = query.start_ms,
                end_ms = query.end_ms,
                diagnostic_log = %log,
                "scheduler failed to start, engine diagnostic log follows"
            ),
            Err(e) => warn!(error = %e, "failed to fetch engine diagnostic log"),
        }
    }
}

fn init_failure(stage: InitStage, source: EngineError) -> InitializationError {
    error!(stage = %stage, error = %source, "initialize => errored");
    record_initialization(false);
    InitializationError {
        stage,
        source: Arc::new(source),
    }
}

/// Log and record the result of a public operation
fn finish<T>(
    operation: &'static str,
    started: Instant,
    result: Result<(T, Outcome)>,
) -> Result<T> {
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok((value, outcome)) => {
            record_operation(operation, outcome, elapsed_ms);
            Ok(value)
        }
        Err(e) => {
            error!(operation, error = %e, "operation errored");
            if let Some(transition) = e.transition() {
                record_transition_failure(transition.as_str());
            }
            record_operation(operation, Outcome::Failed, elapsed_ms);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_engine::{EngineCall, MockConfig, MockEngine};
    use contracts::{Authorization, AuthorizationStrategy};
    use serde_json::Value;

    const WINDOW: &str = "2024-01-01-09:00 2024-01-01-10:00";

    fn persisted_with_schedule() -> EngineState {
        let mut state = EngineState::default();
        state.config.schedule = vec![ScheduleEntry::from(WINDOW)];
        state
            .config
            .extras
            .insert("driver_id".into(), Value::from("d-42"));
        state
    }

    fn controller(engine: MockEngine) -> TrackingController<Arc<MockEngine>> {
        TrackingController::new(Arc::new(engine), InitConfig::default())
    }

    async fn ready_controller(engine: MockEngine) -> TrackingController<Arc<MockEngine>> {
        let controller = controller(engine);
        controller.initialize().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn test_start_when_enabled_is_noop() {
        let mut state = EngineState::default();
        state.enabled = true;
        let controller = ready_controller(MockEngine::with_state(state, MockConfig::default())).await;
        let mutations_after_init = controller.engine().mutation_count();

        controller.start().await.unwrap();

        assert_eq!(controller.engine().mutation_count(), mutations_after_init);
    }

    #[tokio::test]
    async fn test_stop_when_disabled_is_noop() {
        let controller = ready_controller(MockEngine::new()).await;
        let mutations_after_init = controller.engine().mutation_count();

        controller.stop().await.unwrap();

        assert_eq!(controller.engine().mutation_count(), mutations_after_init);
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let controller = controller(MockEngine::new());

        controller.start().await.unwrap();
        assert!(controller.engine().snapshot().enabled);

        controller.stop().await.unwrap();
        assert!(!controller.engine().snapshot().enabled);
    }

    #[tokio::test]
    async fn test_start_verification_failure() {
        let controller = controller(MockEngine::with_config(MockConfig {
            ignore_start: true,
            ..Default::default()
        }));

        let err = controller.start().await.unwrap_err();

        assert_eq!(err.transition(), Some(Transition::TrackingNotEnabled));
        assert_eq!(err.to_string(), "Tracking Not Enabled");
        assert!(controller.engine().calls().contains(&EngineCall::Start));
    }

    #[tokio::test]
    async fn test_stop_verification_failure() {
        let mut state = EngineState::default();
        state.enabled = true;
        let controller = controller(MockEngine::with_state(
            state,
            MockConfig {
                ignore_stop: true,
                ..Default::default()
            },
        ));

        let err = controller.stop().await.unwrap_err();
        assert_eq!(err.to_string(), "Tracking Still Enabled");
    }

    #[tokio::test]
    async fn test_engine_error_passes_through() {
        let controller = ready_controller(MockEngine::with_config(MockConfig {
            fail_get_state: true,
            ..Default::default()
        }))
        .await;

        let err = controller.start().await.unwrap_err();
        assert!(err.is_engine_error());
    }

    #[tokio::test]
    async fn test_add_schedule_preserves_order() {
        let controller = controller(MockEngine::new());

        controller.add_schedule_item("A".into()).await.unwrap();
        let schedule = controller.add_schedule_item("B".into()).await.unwrap();

        assert_eq!(schedule, vec![ScheduleEntry::from("A"), ScheduleEntry::from("B")]);
    }

    #[tokio::test]
    async fn test_add_schedule_appends_duplicates() {
        let controller = controller(MockEngine::new());

        controller.add_schedule_item("A".into()).await.unwrap();
        let schedule = controller.add_schedule_item("A".into()).await.unwrap();

        assert_eq!(schedule.len(), 2);
    }

    #[tokio::test]
    async fn test_add_schedule_keeps_other_fields() {
        let controller = controller(MockEngine::with_state(
            persisted_with_schedule(),
            MockConfig::default(),
        ));

        controller.add_schedule_item("B".into()).await.unwrap();

        let state = controller.engine().snapshot();
        assert_eq!(state.config.extras["driver_id"], "d-42");
        assert_eq!(state.schedule(), &[ScheduleEntry::from(WINDOW), ScheduleEntry::from("B")]);
        let last_write = controller.engine().patches().pop().unwrap();
        assert!(last_write.extras.is_some(), "schedule writes must be full objects");
    }

    #[tokio::test]
    async fn test_clear_empty_schedule_skips_write() {
        let controller = ready_controller(MockEngine::new()).await;
        let mutations_after_init = controller.engine().mutation_count();

        let schedule = controller.clear_schedule().await.unwrap();

        assert!(schedule.is_empty());
        assert_eq!(controller.engine().mutation_count(), mutations_after_init);
    }

    #[tokio::test]
    async fn test_clear_schedule() {
        let controller = controller(MockEngine::with_state(
            persisted_with_schedule(),
            MockConfig::default(),
        ));

        let schedule = controller.clear_schedule().await.unwrap();

        assert!(schedule.is_empty());
        let state = controller.engine().snapshot();
        assert!(state.schedule().is_empty());
        assert_eq!(state.config.extras["driver_id"], "d-42");
    }

    #[tokio::test]
    async fn test_dropped_schedule_write_is_detected() {
        let controller = controller(MockEngine::with_config(MockConfig {
            drop_schedule_writes: true,
            ..Default::default()
        }));

        let err = controller.add_schedule_item("A".into()).await.unwrap_err();
        assert_eq!(err.transition(), Some(Transition::ScheduleNotPersisted));
    }

    #[tokio::test]
    async fn test_initialize_preserves_persisted_schedule() {
        let controller = controller(MockEngine::with_state(
            persisted_with_schedule(),
            MockConfig::default(),
        ));

        controller.initialize().await.unwrap();

        let state = controller.engine().snapshot();
        assert_eq!(state.schedule(), &[ScheduleEntry::from(WINDOW)]);
        assert_eq!(state.config.extras["driver_id"], "d-42");
        assert_eq!(
            controller.engine().calls()[0],
            EngineCall::Ready { reset: false }
        );
    }

    #[tokio::test]
    async fn test_initialize_baseline_overrides_persisted_values() {
        let mut persisted = persisted_with_schedule();
        persisted.config.distance_filter = 99.0;
        persisted.config.max_retention_days = 30;
        let controller = controller(MockEngine::with_state(persisted, MockConfig::default()));

        controller.initialize().await.unwrap();

        let state = controller.engine().snapshot();
        assert_eq!(state.config.distance_filter, 10.0);
        assert_eq!(state.config.max_retention_days, 3);
        assert!(state.config.auto_start_on_boot);
        assert!(state.config.continue_on_app_terminate);
    }

    #[tokio::test]
    async fn test_baseline_patch_never_sets_schedule_or_extras() {
        let controller = controller(MockEngine::with_state(
            persisted_with_schedule(),
            MockConfig::default(),
        ));
        controller.initialize().await.unwrap();

        let patches = controller.engine().patches();
        // ready patch is the bare baseline
        assert!(patches[0].schedule.is_none());
        assert!(patches[0].extras.is_none());
        // the override pass carries the persisted schedule through
        assert_eq!(
            patches[1].schedule.as_deref(),
            Some(&[ScheduleEntry::from(WINDOW)][..])
        );
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_initialization() {
        let controller = controller(MockEngine::with_config(MockConfig {
            ready_delay: Some(Duration::from_millis(20)),
            ..Default::default()
        }));

        let (a, b, c) = tokio::join!(
            controller.start(),
            controller.clear_schedule(),
            controller.initialize()
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert!(c.is_ok());
        assert_eq!(controller.engine().ready_count(), 1);
    }

    #[tokio::test]
    async fn test_initialization_failure_is_replayed() {
        let controller = controller(MockEngine::with_config(MockConfig {
            fail_ready: true,
            ready_delay: Some(Duration::from_millis(10)),
            ..Default::default()
        }));

        let (a, b) = tokio::join!(controller.start(), controller.stop_schedule());
        let a = a.unwrap_err();
        let b = b.unwrap_err();
        assert!(a.is_initialization_error());
        assert!(b.is_initialization_error());
        assert_eq!(a.to_string(), b.to_string());

        let later = controller.add_schedule_item("A".into()).await.unwrap_err();
        assert!(later.is_initialization_error());
        assert_eq!(controller.engine().ready_count(), 1);
        // nothing past the failed ready reached the engine
        assert_eq!(controller.engine().calls().len(), 1);
        assert!(!controller.is_initialized());
    }

    #[tokio::test]
    async fn test_apply_baseline_failure_is_terminal() {
        let controller = controller(MockEngine::with_config(MockConfig {
            fail_set_config: true,
            ..Default::default()
        }));

        let err = controller.initialize().await.unwrap_err();
        assert!(err.to_string().contains("apply_baseline"));
        assert!(controller.start().await.unwrap_err().is_initialization_error());
        assert_eq!(controller.engine().ready_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_swallows_initialization_failure() {
        let controller = TrackingController::connect(
            Arc::new(MockEngine::with_config(MockConfig {
                fail_ready: true,
                ..Default::default()
            })),
            InitConfig::default(),
        )
        .await;

        assert!(!controller.is_initialized());
        assert!(controller.stop().await.unwrap_err().is_initialization_error());
    }

    #[tokio::test]
    async fn test_connect_initializes_eagerly() {
        let controller =
            TrackingController::connect(Arc::new(MockEngine::new()), InitConfig::default()).await;
        assert!(controller.is_initialized());
        assert_eq!(controller.engine().ready_count(), 1);
    }

    #[tokio::test]
    async fn test_start_schedule_success_skips_diagnostics() {
        let controller = controller(MockEngine::with_state(
            persisted_with_schedule(),
            MockConfig::default(),
        ));

        controller.start_schedule().await.unwrap();

        assert!(controller.engine().snapshot().scheduler_enabled);
        assert!(controller.engine().log_queries().is_empty());
    }

    #[tokio::test]
    async fn test_start_schedule_failure_dumps_diagnostics() {
        let controller = controller(MockEngine::with_state(
            persisted_with_schedule(),
            MockConfig {
                ignore_start_schedule: true,
                diagnostic_log: "scheduler: alarm permission missing".into(),
                ..Default::default()
            },
        ));

        let err = controller.start_schedule().await.unwrap_err();

        assert_eq!(err.to_string(), "Scheduler Failed To Start");
        let queries = controller.engine().log_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].span_ms(), 5 * 60 * 1000);
    }

    #[tokio::test]
    async fn test_start_schedule_when_enabled_is_noop() {
        let mut state = persisted_with_schedule();
        state.scheduler_enabled = true;
        let controller = ready_controller(MockEngine::with_state(state, MockConfig::default())).await;
        let mutations_after_init = controller.engine().mutation_count();

        controller.start_schedule().await.unwrap();
        assert_eq!(controller.engine().mutation_count(), mutations_after_init);
    }

    #[tokio::test]
    async fn test_stop_schedule() {
        let mut state = persisted_with_schedule();
        state.scheduler_enabled = true;
        let controller = controller(MockEngine::with_state(state, MockConfig::default()));

        controller.stop_schedule().await.unwrap();
        assert!(!controller.engine().snapshot().scheduler_enabled);
        // stopping a stopped scheduler is a no-op
        controller.stop_schedule().await.unwrap();
        let stops = controller
            .engine()
            .calls()
            .iter()
            .filter(|c| **c == EngineCall::StopSchedule)
            .count();
        assert_eq!(stops, 1);
    }

    #[tokio::test]
    async fn test_stop_schedule_verification_failure() {
        let mut state = persisted_with_schedule();
        state.scheduler_enabled = true;
        let controller = controller(MockEngine::with_state(
            state,
            MockConfig {
                ignore_stop_schedule: true,
                ..Default::default()
            },
        ));

        let err = controller.stop_schedule().await.unwrap_err();
        assert_eq!(err.transition(), Some(Transition::SchedulerFailedToStop));
    }

    #[tokio::test]
    async fn test_custom_diagnostic_window() {
        let controller = controller(MockEngine::with_config(MockConfig {
            ignore_start_schedule: true,
            ..Default::default()
        }))
        .with_diagnostic_window(Duration::from_secs(60));

        assert!(controller.start_schedule().await.is_err());
        assert_eq!(controller.engine().log_queries()[0].span_ms(), 60_000);
    }

    fn secret_baseline() -> InitConfig {
        InitConfig {
            authorization: Some(Authorization {
                strategy: AuthorizationStrategy::Jwt,
                access_token: "very-secret".into(),
                refresh_token: Some("refresh-secret".into()),
                refresh_url: Some("https://auth.example.com/refresh".into()),
                expires: None,
            }),
            ..InitConfig::default()
        }
    }

    #[tokio::test]
    async fn test_state_is_redactable() {
        let controller = TrackingController::new(Arc::new(MockEngine::new()), secret_baseline());

        let state = controller.state().await.unwrap();
        assert!(state.config.authorization.is_some());
        assert!(!state.redacted_json().contains("very-secret"));
    }

    #[tokio::test]
    async fn test_schedule_writes_keep_stored_credentials() {
        let controller = TrackingController::new(Arc::new(MockEngine::new()), secret_baseline());

        controller.add_schedule_item(WINDOW.into()).await.unwrap();
        controller.clear_schedule().await.unwrap();

        let stored = controller.engine().snapshot().config.authorization;
        assert_eq!(stored.map(|a| a.access_token), Some("very-secret".to_string()));
    }

    #[tokio::test]
    async fn test_start_schedule_failure_survives_log_fetch_error() {
        let controller = controller(MockEngine::with_state(
            persisted_with_schedule(),
            MockConfig {
                ignore_start_schedule: true,
                fail_get_log: true,
                ..Default::default()
            },
        ));

        let err = controller.start_schedule().await.unwrap_err();

        assert_eq!(err.transition(), Some(Transition::SchedulerFailedToStart));
        assert_eq!(controller.engine().log_queries().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_band_state_change_is_observed() {
        let controller = ready_controller(MockEngine::new()).await;

        // engine started tracking on its own, e.g. a schedule window opened
        let mut state = controller.engine().snapshot();
        state.enabled = true;
        controller.engine().set_snapshot(state);
        let mutations = controller.engine().mutation_count();

        controller.start().await.unwrap();
        assert_eq!(controller.engine().mutation_count(), mutations);

        controller.stop().await.unwrap();
        assert!(!controller.engine().snapshot().enabled);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn text(&self) -> String {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_emitted_logs_never_contain_credentials() {
        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let controller = TrackingController::new(
            Arc::new(MockEngine::with_config(MockConfig {
                ignore_start_schedule: true,
                diagnostic_log: "scheduler: alarm permission missing".into(),
                ..Default::default()
            })),
            secret_baseline(),
        );

        controller.initialize().await.unwrap();
        controller.start().await.unwrap();
        controller.add_schedule_item(WINDOW.into()).await.unwrap();
        assert!(controller.start_schedule().await.is_err());
        controller.clear_schedule().await.unwrap();
        controller.stop().await.unwrap();
        controller.state().await.unwrap();

        let text = log.text();
        assert!(text.contains("baseline configuration applied"), "nothing captured");
        assert!(text.contains("alarm permission missing"));
        assert!(!text.contains("very-secret"));
        assert!(!text.contains("refresh-secret"));
    }
}
