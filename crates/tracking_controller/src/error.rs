//! Tracking controller error types
//!
//! - [`EngineError`]: raised by the engine itself, passed through unmodified
//! - [`ControllerError`]: what every public controller operation returns

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Engine-level failure (platform / transport)
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine cannot be reached
    #[error("tracking engine unavailable: {message}")]
    Unavailable { message: String },

    /// Engine refused the call
    #[error("tracking engine rejected '{operation}': {message}")]
    Rejected { operation: String, message: String },

    /// Engine could not read or write its persisted state
    #[error("tracking engine storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Persisted engine state is malformed
    #[error("tracking engine state is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Create unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create rejected error
    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Step of the one-time initialization that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    /// `ready` with `reset = false`
    Ready,
    /// `set_config` re-applying the baseline on top of the ready state
    ApplyBaseline,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("ready"),
            Self::ApplyBaseline => f.write_str("apply_baseline"),
        }
    }
}

/// Cached initialization failure
///
/// Cloneable so the same outcome can be handed to every caller.
#[derive(Debug, Clone, Error)]
#[error("initialization failed during {stage}: {source}")]
pub struct InitializationError {
    pub stage: InitStage,
    #[source]
    pub source: Arc<EngineError>,
}

/// Target state the engine accepted but did not reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    TrackingNotEnabled,
    TrackingStillEnabled,
    SchedulerFailedToStart,
    SchedulerFailedToStop,
    /// Schedule returned by the engine differs from the one written
    ScheduleNotPersisted,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrackingNotEnabled => "Tracking Not Enabled",
            Self::TrackingStillEnabled => "Tracking Still Enabled",
            Self::SchedulerFailedToStart => "Scheduler Failed To Start",
            Self::SchedulerFailedToStop => "Scheduler Failed To Stop",
            Self::ScheduleNotPersisted => "Schedule Not Persisted",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every public controller operation
#[derive(Debug, Error)]
pub enum ControllerError {
    /// One-time initialization failed; terminal for the controller
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// Engine accepted the call but post-verification failed
    #[error("{0}")]
    TransitionVerification(Transition),

    /// Engine call failed
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ControllerError {
    #[inline]
    pub fn is_initialization_error(&self) -> bool {
        matches!(self, Self::Initialization(_))
    }

    #[inline]
    pub fn is_verification_error(&self) -> bool {
        matches!(self, Self::TransitionVerification(_))
    }

    #[inline]
    pub fn is_engine_error(&self) -> bool {
        matches!(self, Self::Engine(_))
    }

    /// The transition that failed verification, if any
    pub fn transition(&self) -> Option<Transition> {
        match self {
            Self::TransitionVerification(transition) => Some(*transition),
            _ => None,
        }
    }
}

/// Result alias for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Result alias
pub type Result<T> = std::result::Result<T, ControllerError>;
