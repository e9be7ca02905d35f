//! Metric definitions.
//!
//! All metrics follow Prometheus naming conventions:
//! - `_total` suffix for counters

use ::metrics::describe_counter;

/// Register all metrics with descriptions.
///
/// The embedding process owns the exporter; without one these are no-ops.
pub fn register_metrics() {
    describe_counter!(
        "vdpa_discovery_attempts_total",
        "Total number of network-info reads while discovering the vdpa device"
    );
    describe_counter!(
        "vdpa_discovery_empty_total",
        "Total number of discoveries that ended with the network-info file still empty"
    );
    describe_counter!(
        "vdpa_discovery_failures_total",
        "Total number of discoveries that ended with a persistent read error"
    );
}
