//! EngineConfig / ConfigPatch - engine-held configuration and its write-side view
//!
//! Both structs are generated from a single field list so they cannot drift.
//! Merge rule: every `Some` field of a patch overwrites the engine field, every
//! `None` field is left untouched. There is no "absent means clear".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Authorization, DesiredAccuracy, EngineLogLevel, Notification, ScheduleEntry};

macro_rules! engine_config {
    ($( $(#[doc = $doc:expr])* $field:ident : $ty:ty ),+ $(,)?) => {
        /// Full configuration held by the tracking engine
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct EngineConfig {
            $( $(#[doc = $doc])* pub $field: $ty, )+
        }

        /// Write-side view of [`EngineConfig`]
        ///
        /// `None` leaves the engine value untouched; `Some(v)` sets it to `v`.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct ConfigPatch {
            $(
                $(#[doc = $doc])*
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl EngineConfig {
            /// Merge `patch` into this config, field by field
            pub fn apply(&mut self, patch: &ConfigPatch) {
                $(
                    if let Some(value) = &patch.$field {
                        self.$field = value.clone();
                    }
                )+
            }
        }

        impl ConfigPatch {
            /// Layer `other` on top of this patch: fields `other` defines win
            pub fn overlay(mut self, other: &ConfigPatch) -> Self {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field.clone();
                    }
                )+
                self
            }

            /// Names of the fields this patch will write
            pub fn defined_fields(&self) -> Vec<&'static str> {
                let mut fields = Vec::new();
                $(
                    if self.$field.is_some() {
                        fields.push(stringify!($field));
                    }
                )+
                fields
            }
        }

        impl From<&EngineConfig> for ConfigPatch {
            /// Full patch: writing it back reproduces `config` exactly
            fn from(config: &EngineConfig) -> Self {
                Self {
                    $( $field: Some(config.$field.clone()), )+
                }
            }
        }
    };
}

engine_config! {
    desired_accuracy: DesiredAccuracy,
    /// Metres
    distance_filter: f64,
    /// Minutes
    stop_timeout: u32,
    continue_on_app_terminate: bool,
    auto_start_on_boot: bool,
    foreground_service: bool,
    schedule_use_alarm_manager: bool,
    batch_sync: bool,
    auto_sync: bool,
    url: Option<String>,
    headers: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    max_retention_days: u32,
    authorization: Option<Authorization>,
    notification: Option<Notification>,
    debug: bool,
    log_level: EngineLogLevel,
    /// Time windows evaluated by the scheduler in list order
    schedule: Vec<ScheduleEntry>,
    /// Metadata appended to every recorded location
    extras: Map<String, Value>,
}

/// Engine factory defaults, used on first install and after a reset
impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            desired_accuracy: DesiredAccuracy::High,
            distance_filter: 10.0,
            stop_timeout: 5,
            continue_on_app_terminate: false,
            auto_start_on_boot: false,
            foreground_service: false,
            schedule_use_alarm_manager: false,
            batch_sync: false,
            auto_sync: true,
            url: None,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            max_retention_days: 1,
            authorization: None,
            notification: None,
            debug: false,
            log_level: EngineLogLevel::Off,
            schedule: Vec::new(),
            extras: Map::new(),
        }
    }
}
