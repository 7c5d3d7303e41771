// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
pub enum Unit {}

// Macros for metrics when observability is disabled (args consumed so the
// default build stays warning-free)
#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {{
        let _ = ($name, $value $(, $label, $label_value)*);
    }};
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {{
        let _ = ($name $(, $label, $label_value)*);
    }};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! gauge {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {{
        let _ = ($name, $value $(, $label, $label_value)*);
    }};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! histogram {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {{
        let _ = ($name, $value $(, $label, $label_value)*);
    }};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_gauge {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

// Re-export macros for use in this module when observability is disabled
#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Initializes the descriptions for all the metrics in the application.
/// This should be called once at startup.
pub fn describe_metrics() {
    describe_counter!(
        "catalog_sync_cycles_total",
        "Total synchronization cycles started, labeled by outcome."
    );
    describe_histogram!(
        "catalog_sync_duration_seconds",
        "Wall-clock duration of full synchronization cycles."
    );
    describe_gauge!(
        "catalog_entries",
        "Entries in the current catalog snapshot, labeled by scope."
    );
    describe_counter!(
        "catalog_hydration_dropped_total",
        "Tokens dropped from a hydration cycle after their ledger info fetch failed."
    );
    describe_counter!(
        "catalog_metadata_failures_total",
        "Metadata documents that stayed unavailable after retries."
    );
    describe_counter!(
        "catalog_metadata_retries_total",
        "Transient metadata fetch attempts that were retried."
    );
    describe_counter!(
        "catalog_cache_hits_total",
        "Cache hits, labeled by cache name."
    );
    describe_counter!(
        "catalog_cache_misses_total",
        "Cache misses, labeled by cache name."
    );
    describe_counter!(
        "catalog_refresh_kicks_total",
        "Refresh triggers received, labeled by source (event, poll)."
    );
}

pub fn increment_sync_cycle(outcome: &'static str) {
    counter!("catalog_sync_cycles_total", 1, "outcome" => outcome);
}

pub fn record_sync_duration(seconds: f64) {
    histogram!("catalog_sync_duration_seconds", seconds);
}

pub fn set_catalog_size(scope: String, entries: usize) {
    gauge!("catalog_entries", entries as f64, "scope" => scope);
}

pub fn increment_hydration_dropped() {
    counter!("catalog_hydration_dropped_total", 1);
}

pub fn increment_metadata_failure() {
    counter!("catalog_metadata_failures_total", 1);
}

pub fn increment_metadata_retry() {
    counter!("catalog_metadata_retries_total", 1);
}

pub fn increment_cache_hit(cache: &'static str) {
    counter!("catalog_cache_hits_total", 1, "cache" => cache);
}

pub fn increment_cache_miss(cache: &'static str) {
    counter!("catalog_cache_misses_total", 1, "cache" => cache);
}

pub fn increment_refresh_kick(source: &'static str) {
    counter!("catalog_refresh_kicks_total", 1, "source" => source);
}
