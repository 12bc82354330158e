//! Service-level handlers.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::metrics::encode_metrics;
use crate::state::AppState;
use ventanilla_core::Config;

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Current configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

/// Prometheus metrics in text exposition format
pub async fn metrics() -> String {
    encode_metrics()
}
