//! Prometheus metrics for observability.
//!
//! Covers HTTP-visible queue activity and WebSocket subscriber churn. Gauges
//! that depend on live state are updated at scrape time by the handlers that
//! own that state.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Turn Metrics
// =============================================================================

/// Turns issued since startup.
pub static TURNS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ventanilla_turns_created_total",
        "Total turns issued since startup",
    )
    .unwrap()
});

/// Turn state transitions.
pub static TURN_STATE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ventanilla_turn_state_transitions_total",
            "Turn state transitions",
        ),
        &["from_state", "to_state"],
    )
    .unwrap()
});

/// Successful claims by sector.
pub static CLAIMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ventanilla_claims_total", "Turns claimed by operators"),
        &["sector"],
    )
    .unwrap()
});

/// Claims that found an empty queue.
pub static CLAIMS_EMPTY_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ventanilla_claims_empty_total",
        "Claim attempts that found an empty queue",
    )
    .unwrap()
});

/// Redirections by destination sector.
pub static REDIRECTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ventanilla_redirects_total", "Turn redirections"),
        &["to_sector"],
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ventanilla_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ventanilla_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by event type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ventanilla_ws_messages_sent_total", "WebSocket messages sent"),
        &["event"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(TURNS_CREATED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(TURN_STATE_TRANSITIONS.clone()))
        .unwrap();
    registry.register(Box::new(CLAIMS_TOTAL.clone())).unwrap();
    registry
        .register(Box::new(CLAIMS_EMPTY_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(REDIRECTS_TOTAL.clone())).unwrap();

    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
