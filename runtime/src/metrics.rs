//! Metric names recorded by the Store.
//!
//! The Store records through the [`metrics`](::metrics) facade only. Without
//! an installed recorder every call is a no-op, so binaries decide whether
//! and where metrics are exported.
//!
//! # Example
//!
//! ```
//! use composable_todos_runtime::metrics;
//!
//! // Attach descriptions once, after installing a recorder.
//! metrics::describe_metrics();
//! ```

use ::metrics::{describe_counter, describe_histogram, Unit};

// Re-export metrics macros for use in other modules
pub use ::metrics::{counter, histogram};

/// Total actions reduced by the store
pub const COMMANDS_TOTAL: &str = "store.commands.total";

/// Effects executed, labelled by `type`
pub const EFFECTS_EXECUTED: &str = "store.effects.executed";

/// In-flight effects cancelled, labelled by `id`
pub const EFFECTS_CANCELLED: &str = "store.effects.cancelled";

/// Actions from cancelled effects that were discarded before reduction
pub const DROPPED_ACTIONS: &str = "store.effects.dropped_actions";

/// Time spent inside the reducer per action
pub const REDUCER_DURATION: &str = "store.reducer.duration_seconds";

/// Graceful shutdowns started
pub const SHUTDOWN_INITIATED: &str = "store.shutdown.initiated";

/// Graceful shutdowns that gave up with effects still running
pub const SHUTDOWN_TIMEOUT: &str = "store.shutdown.timeout";

/// Actions rejected because the store was shutting down
pub const REJECTED_ACTIONS: &str = "store.shutdown.rejected_actions";

/// Register descriptions for every Store metric with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(COMMANDS_TOTAL, "Total number of actions reduced");
    describe_counter!(EFFECTS_EXECUTED, "Total number of effects executed by type");
    describe_counter!(EFFECTS_CANCELLED, "Total number of in-flight effects cancelled");
    describe_counter!(
        DROPPED_ACTIONS,
        "Actions discarded because their effect was cancelled"
    );
    describe_histogram!(
        REDUCER_DURATION,
        Unit::Seconds,
        "Reducer execution duration in seconds"
    );
    describe_counter!(SHUTDOWN_INITIATED, "Graceful shutdowns initiated");
    describe_counter!(SHUTDOWN_TIMEOUT, "Graceful shutdowns that timed out");
    describe_counter!(REJECTED_ACTIONS, "Actions rejected during shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_namespaced() {
        for name in [
            COMMANDS_TOTAL,
            EFFECTS_EXECUTED,
            EFFECTS_CANCELLED,
            DROPPED_ACTIONS,
            REDUCER_DURATION,
            SHUTDOWN_INITIATED,
            SHUTDOWN_TIMEOUT,
            REJECTED_ACTIONS,
        ] {
            assert!(name.starts_with("store."), "{name} is not namespaced");
        }
    }

    #[test]
    fn test_describe_without_recorder() {
        // No recorder installed: must be a no-op
        describe_metrics();
    }
}
