//! WebSocket endpoint for live queue events.
//!
//! Clients subscribe to a single sector and receive every event published for
//! it, starting with a `subscribed` acknowledgement. Slow consumers are
//! disconnected from the hub side when their buffer fills.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::turns::ErrorResponse;
use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_MESSAGES_SENT};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub sector: String,
}

/// Upgrade to a WebSocket subscribed to one sector's events
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let sector = match state.service().get_sector(&params.sector) {
        Ok(Some(sector)) => sector,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("sector not found: {}", params.sector),
                }),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, sector.id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, sector_id: String) {
    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    let (subscriber_id, mut events) = state.hub().subscribe(&sector_id);
    debug!(sector_id, subscriber_id, "websocket subscriber connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            envelope = events.recv() => {
                let Some(envelope) = envelope else {
                    // Dropped by the hub, usually because this consumer fell behind.
                    warn!(sector_id, subscriber_id, "event stream closed by hub");
                    break;
                };

                let event_type = envelope.event.event_type();
                match serde_json::to_string(&envelope) {
                    Ok(text) => {
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                        WS_MESSAGES_SENT.with_label_values(&[event_type]).inc();
                    }
                    Err(e) => {
                        warn!(sector_id, error = %e, "failed to serialize event");
                    }
                }
            }
            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames other than close are ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub().unsubscribe(&sector_id, subscriber_id);
    WS_CONNECTIONS_ACTIVE.dec();
    debug!(sector_id, subscriber_id, "websocket subscriber disconnected");
}
