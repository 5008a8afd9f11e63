//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the marquee server:
//! - HTTP request metrics (latency, counts)
//! - Render stream (WebSocket) connection metrics
//! - Sign and configuration gauges (collected dynamically)
//!
//! Core counters (uploads, transitions, advances) are registered alongside.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

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
            "marquee_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "marquee_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Render Stream Metrics
// =============================================================================

/// Renderers currently connected.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "marquee_ws_connections_active",
        "Number of connected sign renderers",
    )
    .unwrap()
});

/// Total renderer connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "marquee_ws_connections_total",
        "Total renderer connections since startup",
    )
    .unwrap()
});

/// Messages exchanged with renderers, by direction and type.
pub static WS_MESSAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_ws_messages_total", "Render stream messages"),
        &["direction", "type"], // "out"/"in"; "show", "idle", "playback_complete", "invalid"
    )
    .unwrap()
});

/// Lag events (a renderer fell behind the directive stream).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "marquee_ws_lag_events_total",
        "Render stream lag events (renderer fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Sign Metrics
// =============================================================================

/// Signs by rotation state (collected dynamically).
pub static SIGNS_BY_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("marquee_signs_by_state", "Current sign count by rotation state"),
        &["state"], // "idle", "playing"
    )
    .unwrap()
});

/// Active configuration revision (collected dynamically).
pub static CONFIG_REVISION: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "marquee_config_revision",
        "Revision of the active configuration",
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

    // Render stream
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(WS_MESSAGES.clone())).unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Signs
    registry
        .register(Box::new(SIGNS_BY_STATE.clone()))
        .unwrap();
    registry
        .register(Box::new(CONFIG_REVISION.clone()))
        .unwrap();

    // Core metrics (ingest, rotation, config reloads)
    for metric in marquee_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the signs right now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    CONFIG_REVISION.set(state.config().snapshot().revision() as i64);

    let statuses = state.fleet().statuses().await;
    let playing = statuses
        .iter()
        .filter(|s| !s.state.rotation.is_idle())
        .count() as i64;
    SIGNS_BY_STATE.with_label_values(&["playing"]).set(playing);
    SIGNS_BY_STATE
        .with_label_values(&["idle"])
        .set(statuses.len() as i64 - playing);
}

/// Normalize a path for metric labels (replace sign ids with a placeholder).
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').collect();
    for i in 1..segments.len() {
        if segments[i - 1] == "signs" && !segments[i].is_empty() {
            segments[i] = "{id}";
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_sign_id() {
        assert_eq!(normalize_path("/api/v1/signs/lobby-left"), "/api/v1/signs/{id}");
    }

    #[test]
    fn test_normalize_path_sign_subresource() {
        assert_eq!(
            normalize_path("/api/v1/signs/lobby-left/complete"),
            "/api/v1/signs/{id}/complete"
        );
    }

    #[test]
    fn test_normalize_path_collection() {
        assert_eq!(normalize_path("/api/v1/signs"), "/api/v1/signs");
        assert_eq!(normalize_path("/api/v1/signs/"), "/api/v1/signs/");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("marquee_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_server_and_core_metrics() {
        // Vec metrics only show up once a label set has been touched.
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        WS_CONNECTIONS_TOTAL.inc();
        SIGNS_BY_STATE.with_label_values(&["idle"]).set(0);
        marquee_core::metrics::UPLOADS_TOTAL
            .with_label_values(&["accepted"])
            .inc();

        let output = encode_metrics();

        assert!(output.contains("marquee_http_request_duration_seconds"));
        assert!(output.contains("marquee_http_requests_in_flight"));
        assert!(output.contains("marquee_ws_connections_total"));
        assert!(output.contains("marquee_signs_by_state"));
        assert!(output.contains("marquee_config_revision"));
        assert!(output.contains("marquee_uploads_total"));
    }
}
