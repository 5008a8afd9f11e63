//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Upload intake (accepted, rejected, unparseable)
//! - Show event delivery to signs
//! - Rotation progress and sign state transitions
//! - Configuration reloads
//! - Dropped audit events

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Ingest Metrics
// =============================================================================

/// Uploads by outcome.
pub static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_uploads_total", "Total show uploads received"),
        &["result"], // "accepted", "unauthenticated", "invalid_credentials", "disabled", "parse_failed"
    )
    .unwrap()
});

/// Show events delivered into sign queues.
pub static SHOW_EVENTS_DELIVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "marquee_show_events_delivered_total",
        "Show events delivered to sign controllers",
    )
    .unwrap()
});

/// Uploads that addressed an auditorium with no sign.
pub static SHOW_EVENTS_UNROUTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "marquee_show_events_unrouted_total",
        "Show events that matched no sign",
    )
    .unwrap()
});

// =============================================================================
// Sign Metrics
// =============================================================================

/// Sign state transitions by kind.
pub static SIGN_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_sign_transitions_total",
            "Sign rotation transitions",
        ),
        &["kind"], // "started", "switched", "stopped"
    )
    .unwrap()
});

/// Asset advances by trigger.
pub static ASSET_ADVANCES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_asset_advances_total", "Rotation advances"),
        &["trigger"], // "timer", "completion"
    )
    .unwrap()
});

/// Completion signals that did not refer to the asset on screen.
pub static STALE_COMPLETIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "marquee_stale_completions_total",
        "Playback completion signals ignored as stale",
    )
    .unwrap()
});

// =============================================================================
// Configuration Metrics
// =============================================================================

/// Configuration reloads by result.
pub static CONFIG_RELOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_config_reloads_total", "Configuration reloads"),
        &["result"], // "accepted", "rejected"
    )
    .unwrap()
});

// =============================================================================
// Audit Metrics
// =============================================================================

/// Audit events dropped before reaching the writer.
pub static AUDIT_EVENTS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_audit_events_dropped_total",
            "Audit events dropped because the audit channel was full or closed",
        ),
        &["reason"], // "full", "closed"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(UPLOADS_TOTAL.clone()),
        Box::new(SHOW_EVENTS_DELIVERED.clone()),
        Box::new(SHOW_EVENTS_UNROUTED.clone()),
        Box::new(SIGN_TRANSITIONS.clone()),
        Box::new(ASSET_ADVANCES.clone()),
        Box::new(STALE_COMPLETIONS.clone()),
        Box::new(CONFIG_RELOADS.clone()),
        Box::new(AUDIT_EVENTS_DROPPED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_are_distinct() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }

    #[test]
    fn test_counters_accept_labels() {
        UPLOADS_TOTAL.with_label_values(&["accepted"]).inc();
        ASSET_ADVANCES.with_label_values(&["timer"]).inc();
        assert!(UPLOADS_TOTAL.with_label_values(&["accepted"]).get() >= 1);
    }
}
