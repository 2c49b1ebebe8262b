//! Prometheus metrics for observability.
//!
//! This module provides the HTTP-side metrics of the reelshelf server:
//! - HTTP request metrics (latency, counts, in flight)
//! - SSE progress stream connections
//! - Cache and job gauges (collected dynamically)
//!
//! Core metrics (rebuilds, downloads, catalog requests) are registered here
//! as well so that a single `/metrics` scrape returns everything.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use regex_lite::Regex;

use reelshelf_core::JobState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelshelf_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelshelf_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelshelf_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// SSE Metrics
// =============================================================================

/// Open progress streams.
pub static SSE_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelshelf_sse_connections_active",
        "Number of open progress event streams",
    )
    .unwrap()
});

/// Progress streams opened since startup.
pub static SSE_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelshelf_sse_connections_total",
        "Total progress event streams since startup",
    )
    .unwrap()
});

/// Frames written to progress streams, by type.
pub static SSE_FRAMES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelshelf_sse_frames_sent_total", "SSE frames sent"),
        &["type"],
    )
    .unwrap()
});

// =============================================================================
// Dynamic Gauges
// =============================================================================

/// Jobs known to the hub, by state.
pub static JOBS_BY_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("reelshelf_jobs_by_state", "Registered jobs by state"),
        &["state"],
    )
    .unwrap()
});

/// Series in the current snapshot.
pub static CACHED_SERIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelshelf_cached_series",
        "Number of series in the cache snapshot",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // SSE
    registry
        .register(Box::new(SSE_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(SSE_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(SSE_FRAMES_SENT.clone()))
        .unwrap();

    // Jobs and cache
    registry.register(Box::new(JOBS_BY_STATE.clone())).unwrap();
    registry.register(Box::new(CACHED_SERIES.clone())).unwrap();

    // Core metrics (cache builder, downloads, catalog client)
    for metric in reelshelf_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called right before encoding so the gauges reflect the hub and the
/// snapshot at scrape time.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let jobs = state.hub().list();
    let running = jobs.iter().filter(|j| j.state == JobState::Running).count();
    JOBS_BY_STATE
        .with_label_values(&["running"])
        .set(running as i64);
    JOBS_BY_STATE
        .with_label_values(&["finished"])
        .set((jobs.len() - running) as i64);

    let cached = state
        .cache()
        .snapshot_summary()
        .await
        .map(|(_, count)| count)
        .unwrap_or(0);
    CACHED_SERIES.set(cached as i64);
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});
static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
