//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Upstream traffic (page requests by outcome)
//! - The result cache (lookups by result)
//! - The age filter (records by verdict)
//! - Torznab requests by type

use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};

// =============================================================================
// Upstream
// =============================================================================

/// Upstream page requests by outcome.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gffree_upstream_requests_total",
            "Total upstream page requests",
        ),
        &["outcome"], // "ok", "rate_limited", "http_error", "timeout", ...
    )
    .unwrap()
});

/// Result cache lookups.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("gffree_cache_lookups_total", "Total result cache lookups"),
        &["result"], // "hit", "miss", "expired"
    )
    .unwrap()
});

/// Records run through the age filter.
pub static RECORDS_FILTERED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gffree_records_filtered_total",
            "Upstream records checked against the minimum age",
        ),
        &["verdict"], // "eligible", "too_young", "bad_timestamp"
    )
    .unwrap()
});

// =============================================================================
// Torznab
// =============================================================================

/// Torznab requests by type.
pub static TORZNAB_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("gffree_torznab_requests_total", "Total Torznab requests"),
        &["type"], // "caps", "search", "tv-search", "movie-search", "probe", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(UPSTREAM_REQUESTS.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(RECORDS_FILTERED.clone()),
        Box::new(TORZNAB_REQUESTS.clone()),
    ]
}
