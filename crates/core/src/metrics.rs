//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Cache rebuilds (outcomes, admitted and skipped series)
//! - Episode downloads (results, bytes transferred)
//! - Catalog requests to the remote panel

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache rebuilds by outcome.
pub static CACHE_REBUILDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelshelf_cache_rebuilds_total", "Total cache rebuilds"),
        &["outcome"], // "completed", "no_categories", "failed"
    )
    .unwrap()
});

/// Series admitted into the snapshot.
pub static SERIES_CACHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelshelf_series_cached_total",
        "Series records admitted into the cache snapshot",
    )
    .unwrap()
});

/// Series dropped by the admission rule.
pub static SERIES_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelshelf_series_skipped_total",
        "Series records dropped because of a missing id or name",
    )
    .unwrap()
});

/// Cache rebuild duration in seconds.
pub static CACHE_REBUILD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelshelf_cache_rebuild_duration_seconds",
            "Duration of a full cache rebuild",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Download batches started.
pub static DOWNLOAD_JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelshelf_download_jobs_started_total",
        "Total download batches started",
    )
    .unwrap()
});

/// Episodes processed by result.
pub static EPISODES_DOWNLOADED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelshelf_episodes_downloaded_total",
            "Episodes processed by download batches",
        ),
        &["result"], // "success", "error"
    )
    .unwrap()
});

/// Bytes written to episode files.
pub static BYTES_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelshelf_bytes_downloaded_total",
        "Total bytes written to episode files",
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics
// =============================================================================

/// Catalog requests by action and outcome.
pub static CATALOG_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelshelf_catalog_requests_total",
            "Requests sent to the remote catalog",
        ),
        &["action", "outcome"], // outcome: "success", "error", "retry"
    )
    .unwrap()
});

/// Catalog request duration in seconds.
pub static CATALOG_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelshelf_catalog_request_duration_seconds",
            "Duration of remote catalog requests, retries included",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["action"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Cache
        Box::new(CACHE_REBUILDS.clone()),
        Box::new(SERIES_CACHED.clone()),
        Box::new(SERIES_SKIPPED.clone()),
        Box::new(CACHE_REBUILD_DURATION.clone()),
        // Downloads
        Box::new(DOWNLOAD_JOBS_STARTED.clone()),
        Box::new(EPISODES_DOWNLOADED.clone()),
        Box::new(BYTES_DOWNLOADED.clone()),
        // Catalog
        Box::new(CATALOG_REQUESTS.clone()),
        Box::new(CATALOG_REQUEST_DURATION.clone()),
    ]
}
