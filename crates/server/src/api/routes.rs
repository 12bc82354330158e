//! Route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{audit, handlers, sectors, turns, ws};
use crate::state::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/audit", get(audit::query_audit))
        .route("/turns", post(turns::create_turn))
        .route(
            "/turns/{id}",
            get(turns::get_turn).delete(turns::cancel_turn),
        )
        .route("/turns/{id}/start", post(turns::start_turn))
        .route("/turns/{id}/finish", post(turns::finish_turn))
        .route("/turns/{id}/absent", post(turns::absent_turn))
        .route("/turns/{id}/redirect", post(turns::redirect_turn))
        .route("/sectors", get(sectors::list_sectors))
        .route("/sectors/{id}", get(sectors::get_sector))
        .route("/sectors/{id}/queue", get(sectors::get_queue))
        .route("/sectors/{id}/claim", post(sectors::claim_next))
        .route("/sectors/{id}/active", post(sectors::set_active))
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .nest("/api/v1", api)
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
