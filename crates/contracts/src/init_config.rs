//! InitConfig - Config Loader output
//!
//! The baseline tracking configuration applied once per controller: location
//! tuning, persistence behaviour, upload metadata and credentials.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ConfigPatch;

/// Location accuracy requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredAccuracy {
    #[default]
    High,
    Medium,
    Low,
    Lowest,
}

/// Engine diagnostic log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineLogLevel {
    Off,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
    Verbose,
}

/// Credential strategy for upload requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStrategy {
    #[default]
    Jwt,
    Sas,
}

/// Upload credentials
///
/// `Debug` never prints token material; log output must go through
/// [`EngineState::redacted`](crate::EngineState::redacted) before serialization.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Authorization {
    #[serde(default)]
    pub strategy: AuthorizationStrategy,

    #[validate(length(min = 1, message = "access_token cannot be empty"))]
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub refresh_url: Option<String>,

    /// Token expiry, epoch seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorization")
            .field("strategy", &self.strategy)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_url", &self.refresh_url)
            .field("expires", &self.expires)
            .finish()
    }
}

/// Foreground-service notification shown while tracking
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Baseline configuration
///
/// On first install this is the configuration the engine starts from. On later
/// runs every field defined here overrides the persisted engine value, while
/// engine-owned fields (`schedule`, `extras`) keep what the previous run stored.
/// Unknown fields are rejected, so a config file cannot smuggle a `schedule` in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct InitConfig {
    pub desired_accuracy: DesiredAccuracy,

    /// Minimum distance (metres) between recorded locations
    #[validate(range(min = 0.0, message = "distance_filter must be >= 0"))]
    pub distance_filter: f64,

    /// Minutes without motion before the engine enters the stationary state
    pub stop_timeout: u32,

    /// Keep tracking after the host application terminates
    pub continue_on_app_terminate: bool,

    /// Resume tracking after device boot
    pub auto_start_on_boot: bool,

    pub foreground_service: bool,

    /// Use the precise alarm scheduler on platforms that offer a choice
    pub schedule_use_alarm_manager: bool,

    pub batch_sync: bool,

    pub auto_sync: bool,

    /// Upload endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub url: Option<String>,

    pub headers: BTreeMap<String, String>,

    pub params: BTreeMap<String, String>,

    /// Days to retain unsent locations
    #[validate(range(min = 1, message = "max_retention_days must be >= 1"))]
    pub max_retention_days: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub authorization: Option<Authorization>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,

    pub debug: bool,

    pub log_level: EngineLogLevel,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            desired_accuracy: DesiredAccuracy::High,
            distance_filter: 10.0,
            stop_timeout: 1,
            continue_on_app_terminate: true,
            auto_start_on_boot: true,
            foreground_service: true,
            schedule_use_alarm_manager: true,
            batch_sync: false,
            auto_sync: true,
            url: None,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            max_retention_days: 3,
            authorization: None,
            notification: Some(Notification {
                channel_name: Some("Driver Location Tracking".to_string()),
                small_icon: Some("drawable/location_notification_icon".to_string()),
                title: None,
                text: None,
            }),
            debug: false,
            log_level: EngineLogLevel::Verbose,
        }
    }
}

impl InitConfig {
    /// Patch carrying every field this baseline defines
    ///
    /// Optional fields left unset here (`url`, `authorization`, `notification`)
    /// stay `None` so the engine keeps its own value. `schedule` and `extras`
    /// are always `None`.
    pub fn to_patch(&self) -> ConfigPatch {
        ConfigPatch {
            desired_accuracy: Some(self.desired_accuracy),
            distance_filter: Some(self.distance_filter),
            stop_timeout: Some(self.stop_timeout),
            continue_on_app_terminate: Some(self.continue_on_app_terminate),
            auto_start_on_boot: Some(self.auto_start_on_boot),
            foreground_service: Some(self.foreground_service),
            schedule_use_alarm_manager: Some(self.schedule_use_alarm_manager),
            batch_sync: Some(self.batch_sync),
            auto_sync: Some(self.auto_sync),
            url: self.url.clone().map(Some),
            headers: Some(self.headers.clone()),
            params: Some(self.params.clone()),
            max_retention_days: Some(self.max_retention_days),
            authorization: self.authorization.clone().map(Some),
            notification: self.notification.clone().map(Some),
            debug: Some(self.debug),
            log_level: Some(self.log_level),
            schedule: None,
            extras: None,
        }
    }
}
