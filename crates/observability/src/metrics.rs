//! Tracking controller metrics
//!
//! Counters and gauges recorded around every controller operation. With no
//! recorder installed (tests, `metrics_port = None`) these calls are no-ops.

use metrics::{counter, gauge, histogram};

/// Result of a controller operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Engine mutated and verified
    Changed,
    /// Target state already reached, no mutation issued
    Unchanged,
    /// Operation returned an error
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::Failed => "failed",
        }
    }
}

/// Record one controller operation
///
/// # Example
///
/// ```ignore
/// use observability::metrics::{record_operation, Outcome};
///
/// record_operation("start", Outcome::Unchanged, 1.2);
/// ```
pub fn record_operation(operation: &'static str, outcome: Outcome, duration_ms: f64) {
    counter!(
        "geotrack_operations_total",
        "operation" => operation,
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!("geotrack_operation_duration_ms", "operation" => operation).record(duration_ms);
}

/// Record a transition the engine accepted but did not perform
pub fn record_transition_failure(transition: &'static str) {
    counter!("geotrack_transition_failures_total", "transition" => transition).increment(1);
}

/// Record the one-shot initialization result
pub fn record_initialization(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("geotrack_initializations_total", "outcome" => outcome).increment(1);
}

/// Record the schedule length last observed on the engine
pub fn record_schedule_entries(count: usize) {
    gauge!("geotrack_schedule_entries").set(count as f64);
}
