//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sessions (expiry sweeps)
//! - Conversions (outcomes, durations, in-flight count)
//! - Uploads and downloads

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Session Metrics
// =============================================================================

/// Sessions created total.
pub static SESSIONS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mediaconv_sessions_created_total", "Total sessions created").unwrap()
});

/// Sessions removed by the expiry sweep.
pub static SESSIONS_EXPIRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediaconv_sessions_expired_total",
        "Total sessions removed after inactivity",
    )
    .unwrap()
});

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediaconv_conversions_total", "Total file conversions"),
        &["result"], // "success", "failed", "timeout"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediaconv_conversion_duration_seconds",
            "Duration of file conversions",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["media_type"],
    )
    .unwrap()
});

/// Conversions currently holding a worker slot.
pub static CONVERSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediaconv_conversions_active",
        "Number of conversions currently running",
    )
    .unwrap()
});

// =============================================================================
// Transfer Metrics
// =============================================================================

/// Files accepted by upload.
pub static FILES_UPLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mediaconv_files_uploaded_total", "Total files uploaded").unwrap()
});

/// Downloads served by kind.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediaconv_downloads_total", "Total downloads served"),
        &["kind"], // "single", "archive"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sessions
        Box::new(SESSIONS_CREATED.clone()),
        Box::new(SESSIONS_EXPIRED.clone()),
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(CONVERSIONS_ACTIVE.clone()),
        // Transfers
        Box::new(FILES_UPLOADED.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
    ]
}
