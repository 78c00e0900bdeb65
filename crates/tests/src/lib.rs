//! # Integration Tests
//!
//! End-to-end tests across crates.
//!
//! Covers:
//! - Config file -> controller -> file engine
//! - Engine state surviving a controller restart
//! - Concurrent callers against a persisted engine

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_baseline_patch_leaves_schedule_and_extras_untouched() {
        let patch = contracts::InitConfig::default().to_patch();
        assert!(patch.schedule.is_none());
        assert!(patch.extras.is_none());
        assert!(patch.authorization.is_none());
        assert_eq!(patch.max_retention_days, Some(3));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{InitConfig, ScheduleEntry};
    use serde_json::Value;
    use tempfile::tempdir;
    use tracking_controller::{FileEngine, TrackingController, TrackingEngine, Transition};

    const CONFIG: &str = r#"
distance_filter = 25.0
stop_timeout = 2
auto_start_on_boot = true
continue_on_app_terminate = true
url = "https://tracker.example.com/locations"
max_retention_days = 7

[headers]
x-fleet = "north"

[authorization]
strategy = "jwt"
access_token = "token-123"
"#;

    const MORNING: &str = "2024-01-01-09:00 2024-01-01-12:00";
    const AFTERNOON: &str = "2024-01-01-13:00 2024-01-01-17:00";

    fn baseline() -> InitConfig {
        ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap()
    }

    fn open_controller(path: &Path) -> TrackingController<FileEngine> {
        TrackingController::new(FileEngine::open(path), baseline())
    }

    /// Config file -> controller -> file engine
    ///
    /// Baseline values land in the engine and the schedule survives a
    /// controller restart, including its re-initialization.
    #[tokio::test]
    async fn test_e2e_schedule_survives_restart() {
        let dir = tempdir().unwrap();
        let state_file = dir.path().join("state.json");

        let first = open_controller(&state_file);
        first.add_schedule_item(MORNING.into()).await.unwrap();
        first.add_schedule_item(AFTERNOON.into()).await.unwrap();
        first.start_schedule().await.unwrap();
        drop(first);

        let second = open_controller(&state_file);
        let state = second.state().await.unwrap();

        assert_eq!(
            state.schedule(),
            &[ScheduleEntry::from(MORNING), ScheduleEntry::from(AFTERNOON)]
        );
        assert!(state.scheduler_enabled);
        assert_eq!(state.config.distance_filter, 25.0);
        assert_eq!(state.config.max_retention_days, 7);
        assert_eq!(state.config.headers["x-fleet"], "north");
        assert!(state.config.auto_start_on_boot);
    }

    /// Baseline changes between runs override persisted values but keep
    /// fields only the engine knows about
    #[tokio::test]
    async fn test_e2e_baseline_override_keeps_extras() {
        let dir = tempdir().unwrap();
        let state_file = dir.path().join("state.json");

        let engine = FileEngine::open(&state_file);
        let mut extras = serde_json::Map::new();
        extras.insert("driver_id".into(), Value::from("d-42"));
        engine
            .set_config(contracts::ConfigPatch {
                distance_filter: Some(500.0),
                extras: Some(extras),
                schedule: Some(vec![ScheduleEntry::from(MORNING)]),
                ..Default::default()
            })
            .await
            .unwrap();

        let controller = TrackingController::new(engine, baseline());
        controller.initialize().await.unwrap();

        let state = controller.state().await.unwrap();
        assert_eq!(state.config.distance_filter, 25.0);
        assert_eq!(state.config.extras["driver_id"], "d-42");
        assert_eq!(state.schedule(), &[ScheduleEntry::from(MORNING)]);
    }

    #[tokio::test]
    async fn test_e2e_tracking_lifecycle() {
        let dir = tempdir().unwrap();
        let state_file = dir.path().join("state.json");
        let controller = open_controller(&state_file);

        controller.start().await.unwrap();
        controller.start().await.unwrap();
        assert!(controller.state().await.unwrap().enabled);

        // tracking state is persisted too
        let restarted = open_controller(&state_file);
        assert!(restarted.state().await.unwrap().enabled);
        restarted.stop().await.unwrap();
        assert!(!restarted.state().await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_e2e_empty_schedule_fails_to_start() {
        let dir = tempdir().unwrap();
        let controller = open_controller(&dir.path().join("state.json"));

        let err = controller.start_schedule().await.unwrap_err();
        assert_eq!(err.transition(), Some(Transition::SchedulerFailedToStart));

        // scheduler can start once an entry exists
        controller.add_schedule_item(MORNING.into()).await.unwrap();
        controller.start_schedule().await.unwrap();
        controller.stop_schedule().await.unwrap();

        let state = controller.state().await.unwrap();
        assert!(!state.scheduler_enabled);
        assert!(!state.enabled);
    }

    #[tokio::test]
    async fn test_e2e_concurrent_adds_are_not_lost() {
        let dir = tempdir().unwrap();
        let controller = Arc::new(open_controller(&dir.path().join("state.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    let entry = format!("2024-01-0{}-09:00 2024-01-0{}-10:00", i + 1, i + 1);
                    controller.add_schedule_item(entry.into()).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let schedule = controller.state().await.unwrap().config.schedule;
        assert_eq!(schedule.len(), 8);
        assert_eq!(
            controller.clear_schedule().await.unwrap(),
            Vec::<ScheduleEntry>::new()
        );
    }

    #[tokio::test]
    async fn test_e2e_state_file_never_logs_credentials_in_redacted_view() {
        let dir = tempdir().unwrap();
        let controller = open_controller(&dir.path().join("state.json"));

        let state = controller.state().await.unwrap();
        assert!(state.config.authorization.is_some());
        assert!(!state.redacted_json().contains("token-123"));
    }
}
