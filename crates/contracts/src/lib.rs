//! # Contracts
//!
//! Frozen interface contracts shared by every geotrack crate.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Config model
//! - [`InitConfig`]: the baseline applied once per controller
//! - [`EngineConfig`]: the full configuration held by the tracking engine
//! - [`ConfigPatch`]: write-side view of `EngineConfig`, `None` fields are left untouched
//!
//! `InitConfig` has no `schedule` and no `extras`, so the patch derived from it
//! can never clear state persisted by a previous run.

mod engine_config;
mod error;
mod init_config;
mod schedule;
mod state;

pub use engine_config::*;
pub use error::*;
pub use init_config::*;
pub use schedule::*;
pub use state::*;
