//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Live realtime sessions gauge
//! - Delivered events and delivery failures by event category
//! - Sent messages by kind (direct, group)
//! - Announced presence changes by status
//! - Unread entries dropped as corrupt

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "messenger";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Live sessions held by the session registry
pub static SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("sessions_active", "Number of live realtime sessions").namespace(NAMESPACE),
    )
    .expect("Failed to create SESSIONS_ACTIVE metric")
});

/// Events written to a session transport
pub static EVENTS_DELIVERED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("events_delivered_total", "Events delivered to live sessions")
            .namespace(NAMESPACE),
        &["category"],
    )
    .expect("Failed to create EVENTS_DELIVERED_TOTAL metric")
});

/// Events a session transport refused
pub static DELIVERY_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "delivery_failures_total",
            "Events that could not be written to a session",
        )
        .namespace(NAMESPACE),
        &["category"],
    )
    .expect("Failed to create DELIVERY_FAILURES_TOTAL metric")
});

/// Persisted messages
pub static MESSAGES_SENT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("messages_sent_total", "Messages stamped and persisted").namespace(NAMESPACE),
        &["kind"], // "direct", "group"
    )
    .expect("Failed to create MESSAGES_SENT_TOTAL metric")
});

/// Aggregate presence changes announced to other users
pub static PRESENCE_CHANGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("presence_changes_total", "Announced presence changes").namespace(NAMESPACE),
        &["status"],
    )
    .expect("Failed to create PRESENCE_CHANGES_TOTAL metric")
});

/// Unread entries dropped because their backing messages were missing
pub static UNREAD_ENTRIES_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "unread_entries_dropped_total",
            "Unread entries dropped as inconsistent",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create UNREAD_ENTRIES_DROPPED_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(SESSIONS_ACTIVE.clone()))
        .expect("Failed to register SESSIONS_ACTIVE");
    registry
        .register(Box::new(EVENTS_DELIVERED_TOTAL.clone()))
        .expect("Failed to register EVENTS_DELIVERED_TOTAL");
    registry
        .register(Box::new(DELIVERY_FAILURES_TOTAL.clone()))
        .expect("Failed to register DELIVERY_FAILURES_TOTAL");
    registry
        .register(Box::new(MESSAGES_SENT_TOTAL.clone()))
        .expect("Failed to register MESSAGES_SENT_TOTAL");
    registry
        .register(Box::new(PRESENCE_CHANGES_TOTAL.clone()))
        .expect("Failed to register PRESENCE_CHANGES_TOTAL");
    registry
        .register(Box::new(UNREAD_ENTRIES_DROPPED_TOTAL.clone()))
        .expect("Failed to register UNREAD_ENTRIES_DROPPED_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn set_active_sessions(count: usize) {
    SESSIONS_ACTIVE.set(count as i64);
}

pub fn record_delivery(category: &str, delivered: usize, failed: usize) {
    if delivered > 0 {
        EVENTS_DELIVERED_TOTAL
            .with_label_values(&[category])
            .inc_by(delivered as u64);
    }
    if failed > 0 {
        DELIVERY_FAILURES_TOTAL
            .with_label_values(&[category])
            .inc_by(failed as u64);
    }
}

pub fn record_message_sent(kind: &str) {
    MESSAGES_SENT_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_presence_change(status: &str) {
    PRESENCE_CHANGES_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_unread_entry_dropped() {
    UNREAD_ENTRIES_DROPPED_TOTAL.inc();
}
