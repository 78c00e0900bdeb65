//! Tracking engine abstraction
//!
//! The engine performs location sensing, upload and persistence. The controller
//! only issues lifecycle commands and config updates and reads state back.
//! Real platform engines, the in-memory mock and the file-backed engine all
//! sit behind this trait.

use std::future::Future;
use std::sync::Arc;

use contracts::{ConfigPatch, EngineState, LogQuery, ReadyRequest};

use crate::error::EngineResult;

/// Tracking engine trait
///
/// Every mutating call returns the engine state observed after the call. That
/// value is only a hint; callers that need certainty read state again.
pub trait TrackingEngine: Send + Sync {
    /// One-time readiness call
    ///
    /// With `reset = false` the engine applies `request.config` on top of the
    /// configuration persisted by earlier runs.
    fn ready(&self, request: ReadyRequest) -> impl Future<Output = EngineResult<EngineState>> + Send;

    /// Merge `patch` into the engine configuration
    ///
    /// Fields left `None` keep their current value.
    fn set_config(&self, patch: ConfigPatch) -> impl Future<Output = EngineResult<EngineState>> + Send;

    /// Current engine state
    fn get_state(&self) -> impl Future<Output = EngineResult<EngineState>> + Send;

    /// Start continuous tracking
    fn start(&self) -> impl Future<Output = EngineResult<EngineState>> + Send;

    /// Stop continuous tracking
    fn stop(&self) -> impl Future<Output = EngineResult<EngineState>> + Send;

    /// Start the time-window scheduler
    fn start_schedule(&self) -> impl Future<Output = EngineResult<EngineState>> + Send;

    /// Stop the time-window scheduler
    fn stop_schedule(&self) -> impl Future<Output = EngineResult<EngineState>> + Send;

    /// Engine diagnostic log lines inside `query`
    fn get_log(&self, query: LogQuery) -> impl Future<Output = EngineResult<String>> + Send;
}

impl<E: TrackingEngine> TrackingEngine for Arc<E> {
    fn ready(&self, request: ReadyRequest) -> impl Future<Output = EngineResult<EngineState>> + Send {
        (**self).ready(request)
    }

    fn set_config(&self, patch: ConfigPatch) -> impl Future<Output = EngineResult<EngineState>> + Send {
        (**self).set_config(patch)
    }

    fn get_state(&self) -> impl Future<Output = EngineResult<EngineState>> + Send {
        (**self).get_state()
    }

    fn start(&self) -> impl Future<Output = EngineResult<EngineState>> + Send {
        (**self).start()
    }

    fn stop(&self) -> impl Future<Output = EngineResult<EngineState>> + Send {
        (**self).stop()
    }

    fn start_schedule(&self) -> impl Future<Output = EngineResult<EngineState>> + Send {
        (**self).start_schedule()
    }

    fn stop_schedule(&self) -> impl Future<Output = EngineResult<EngineState>> + Send {
        (**self).stop_schedule()
    }

    fn get_log(&self, query: LogQuery) -> impl Future<Output = EngineResult<String>> + Send {
        (**self).get_log(query)
    }
}
