use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::domain::FilterMode;

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total projections served
    pub projections_total: AtomicU64,

    /// Projections by filter mode
    pub projections_affected: AtomicU64,
    pub projections_owned: AtomicU64,
    pub projections_all: AtomicU64,

    /// Filtered views served whole because the object details were discarded
    pub projections_unfiltered: AtomicU64,

    /// Load failures
    pub traces_not_found: AtomicU64,
    pub trace_load_errors: AtomicU64,

    /// Identity resolution
    pub resolver_failures: AtomicU64,
    pub references_resolved_total: AtomicU64,
    pub references_unresolved_total: AtomicU64,

    /// Projection latency buckets (microseconds)
    pub latency_under_1ms: AtomicU64,
    pub latency_1_5ms: AtomicU64,
    pub latency_5_10ms: AtomicU64,
    pub latency_10_50ms: AtomicU64,
    pub latency_50_100ms: AtomicU64,
    pub latency_over_100ms: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record a served projection.
    pub fn record_projection(&self, mode: FilterMode, details_discarded: bool) {
        self.projections_total.fetch_add(1, Ordering::Relaxed);

        match mode {
            FilterMode::Affected => {
                self.projections_affected.fetch_add(1, Ordering::Relaxed);
            }
            FilterMode::Owned => {
                self.projections_owned.fetch_add(1, Ordering::Relaxed);
            }
            FilterMode::All => {
                self.projections_all.fetch_add(1, Ordering::Relaxed);
            }
        }

        if mode.is_filtering() && details_discarded {
            self.projections_unfiltered.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a transcript that could not be loaded.
    pub fn record_load_failure(&self, not_found: bool) {
        if not_found {
            self.traces_not_found.fetch_add(1, Ordering::Relaxed);
        } else {
            self.trace_load_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_resolver_failure(&self) {
        self.resolver_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how many references did and did not resolve to a name.
    pub fn record_references(&self, resolved: usize, unresolved: usize) {
        self.references_resolved_total
            .fetch_add(resolved as u64, Ordering::Relaxed);
        self.references_unresolved_total
            .fetch_add(unresolved as u64, Ordering::Relaxed);
    }

    /// Record projection latency.
    pub fn record_latency(&self, start: Instant) {
        let micros = start.elapsed().as_micros() as u64;

        if micros < 1000 {
            self.latency_under_1ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 5000 {
            self.latency_1_5ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 10000 {
            self.latency_5_10ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 50000 {
            self.latency_10_50ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 100000 {
            self.latency_50_100ms.fetch_add(1, Ordering::Relaxed);
        } else {
            self.latency_over_100ms.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        format!(
            r#"# HELP ruletrace_projections_total Total transcript projections served
# TYPE ruletrace_projections_total counter
ruletrace_projections_total {}

# HELP ruletrace_projections Projections by filter mode
# TYPE ruletrace_projections counter
ruletrace_projections{{filter="affected"}} {}
ruletrace_projections{{filter="owned"}} {}
ruletrace_projections{{filter="all"}} {}

# HELP ruletrace_projections_unfiltered_total Filtered views served whole (details discarded)
# TYPE ruletrace_projections_unfiltered_total counter
ruletrace_projections_unfiltered_total {}

# HELP ruletrace_trace_load_failures_total Transcript load failures
# TYPE ruletrace_trace_load_failures_total counter
ruletrace_trace_load_failures_total{{reason="not_found"}} {}
ruletrace_trace_load_failures_total{{reason="error"}} {}

# HELP ruletrace_resolver_failures_total Identity resolution failures
# TYPE ruletrace_resolver_failures_total counter
ruletrace_resolver_failures_total {}

# HELP ruletrace_references_total References collected for resolution
# TYPE ruletrace_references_total counter
ruletrace_references_total{{resolved="true"}} {}
ruletrace_references_total{{resolved="false"}} {}

# HELP ruletrace_projection_latency_bucket Projection latency histogram
# TYPE ruletrace_projection_latency_bucket counter
ruletrace_projection_latency_bucket{{le="0.001"}} {}
ruletrace_projection_latency_bucket{{le="0.005"}} {}
ruletrace_projection_latency_bucket{{le="0.01"}} {}
ruletrace_projection_latency_bucket{{le="0.05"}} {}
ruletrace_projection_latency_bucket{{le="0.1"}} {}
ruletrace_projection_latency_bucket{{le="+Inf"}} {}
"#,
            self.projections_total.load(Ordering::Relaxed),
            self.projections_affected.load(Ordering::Relaxed),
            self.projections_owned.load(Ordering::Relaxed),
            self.projections_all.load(Ordering::Relaxed),
            self.projections_unfiltered.load(Ordering::Relaxed),
            self.traces_not_found.load(Ordering::Relaxed),
            self.trace_load_errors.load(Ordering::Relaxed),
            self.resolver_failures.load(Ordering::Relaxed),
            self.references_resolved_total.load(Ordering::Relaxed),
            self.references_unresolved_total.load(Ordering::Relaxed),
            self.latency_under_1ms.load(Ordering::Relaxed),
            self.latency_1_5ms.load(Ordering::Relaxed),
            self.latency_5_10ms.load(Ordering::Relaxed),
            self.latency_10_50ms.load(Ordering::Relaxed),
            self.latency_50_100ms.load(Ordering::Relaxed),
            self.latency_over_100ms.load(Ordering::Relaxed),
        )
    }
}
