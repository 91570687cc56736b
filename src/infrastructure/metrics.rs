//! Metrics recording for the cache and the external query path
//!
//! Counters go through the `metrics` facade and are no-ops until a recorder
//! is installed by the embedding application.

use std::time::Duration;

use metrics::{counter, histogram};

/// Where a cache lookup was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    MemoryHit,
    DiskHit,
    Miss,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemoryHit => "memory",
            Self::DiskHit => "disk",
            Self::Miss => "miss",
        }
    }
}

/// Record the outcome of a cache lookup
pub fn record_cache_lookup(outcome: LookupOutcome) {
    counter!("query_cache_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record a recovered disk-tier failure
pub fn record_cache_io_error(operation: &'static str) {
    counter!("query_cache_io_errors_total", "operation" => operation).increment(1);
}

/// Record an external query execution
pub fn record_external_query(duration: Duration, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!("external_queries_total", "status" => status).increment(1);
    histogram!("external_query_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
}
