//! Cache metrics.
//!
//! Recorded through the `metrics` facade; installing an exporter is left to
//! the host process.

use metrics::counter;
use pose_models::CacheNamespace;

/// Metric names.
pub mod names {
    /// Cache lookups that found an entry, by namespace.
    pub const CACHE_HITS_TOTAL: &str = "pose_cache_hits_total";

    /// Cache lookups that found nothing, by namespace.
    pub const CACHE_MISSES_TOTAL: &str = "pose_cache_misses_total";

    /// Successful cache writes, by namespace.
    pub const CACHE_WRITES_TOTAL: &str = "pose_cache_writes_total";

    /// Backend or serialization failures, by namespace and operation.
    pub const CACHE_ERRORS_TOTAL: &str = "pose_cache_errors_total";

    /// Entries removed by the TTL sweep, by namespace.
    pub const CACHE_EVICTIONS_TOTAL: &str = "pose_cache_evictions_total";
}

pub fn record_hit(namespace: CacheNamespace) {
    counter!(names::CACHE_HITS_TOTAL, "namespace" => namespace.as_str()).increment(1);
}

pub fn record_miss(namespace: CacheNamespace) {
    counter!(names::CACHE_MISSES_TOTAL, "namespace" => namespace.as_str()).increment(1);
}

pub fn record_write(namespace: CacheNamespace) {
    counter!(names::CACHE_WRITES_TOTAL, "namespace" => namespace.as_str()).increment(1);
}

pub fn record_error(namespace: CacheNamespace, operation: &'static str) {
    counter!(
        names::CACHE_ERRORS_TOTAL,
        "namespace" => namespace.as_str(),
        "operation" => operation
    )
    .increment(1);
}

pub fn record_evictions(namespace: CacheNamespace, removed: u64) {
    counter!(names::CACHE_EVICTIONS_TOTAL, "namespace" => namespace.as_str()).increment(removed);
}
