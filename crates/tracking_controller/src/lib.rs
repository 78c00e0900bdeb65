//! # Tracking Controller
//!
//! Lifecycle controller for a location-tracking engine.
//!
//! Responsibilities:
//! - Initialize the engine exactly once, preserving its persisted schedule
//! - Start / stop continuous tracking idempotently
//! - Start / stop the time-window scheduler, with diagnostics on failure
//! - Edit the schedule without dropping any other persisted field
//!
//! Every state change is verified by reading engine state back.
//!
//! ## Engines
//!
//! - [`MockEngine`]: in-memory, failure injection, call recording
//! - [`FileEngine`]: persists state to a JSON file across processes

pub mod controller;
pub mod engine;
pub mod error;
pub mod file_engine;
pub mod mock_engine;

pub use contracts::{EngineState, InitConfig, ScheduleEntry};
pub use controller::{TrackingController, DEFAULT_DIAGNOSTIC_WINDOW};
pub use engine::TrackingEngine;
pub use error::{
    ControllerError, EngineError, EngineResult, InitStage, InitializationError, Result, Transition,
};
pub use file_engine::FileEngine;
pub use mock_engine::{EngineCall, MockConfig, MockEngine};
