//! Turn API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ventanilla_core::{CreateTurnRequest, ServiceError, Turn, TurnKind, TurnState};

use crate::metrics::{REDIRECTS_TOTAL, TURNS_CREATED_TOTAL, TURN_STATE_TRANSITIONS};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for issuing a turn
#[derive(Debug, Deserialize)]
pub struct CreateTurnBody {
    pub sector_id: String,
    pub citizen_id: String,
    /// Walk-in when omitted
    pub kind: Option<TurnKind>,
    pub priority: Option<u16>,
}

/// Request body for operator actions on a turn
#[derive(Debug, Deserialize)]
pub struct OperatorActionBody {
    pub employee_id: String,
    pub notes: Option<String>,
}

/// Request body for redirecting a turn
#[derive(Debug, Deserialize)]
pub struct RedirectBody {
    pub employee_id: String,
    pub to_sector_id: String,
    pub reason: Option<String>,
}

/// Request body for cancelling a turn
#[derive(Debug, Deserialize, Default)]
pub struct CancelBody {
    /// Absent when the citizen cancels their own turn
    pub employee_id: Option<String>,
    pub reason: Option<String>,
}

/// Response for turn operations
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub id: String,
    pub code: String,
    pub sector_id: String,
    pub citizen_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    pub state: TurnState,
    pub kind: TurnKind,
    pub priority: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub called_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attended_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    pub updated_at: String,
}

impl From<Turn> for TurnResponse {
    fn from(turn: Turn) -> Self {
        Self {
            id: turn.id,
            code: turn.code,
            sector_id: turn.sector_id,
            citizen_id: turn.citizen_id,
            employee_id: turn.employee_id,
            state: turn.state,
            kind: turn.kind,
            priority: turn.priority,
            notes: turn.notes,
            created_at: turn.created_at.to_rfc3339(),
            called_at: turn.called_at.map(|t| t.to_rfc3339()),
            attended_at: turn.attended_at.map(|t| t.to_rfc3339()),
            finished_at: turn.finished_at.map(|t| t.to_rfc3339()),
            updated_at: turn.updated_at.to_rfc3339(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a service error to an HTTP status and error body.
pub(crate) fn error_response(e: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        ServiceError::NotFound(_) | ServiceError::SectorNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ServiceError::InvalidTransition(_)
        | ServiceError::SameSector { .. }
        | ServiceError::SectorInactive(_)
        | ServiceError::CapacityExceeded { .. }
        | ServiceError::Contended(_) => StatusCode::CONFLICT,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

// ============================================================================
// Handlers
// ============================================================================

/// Issue a new turn
pub async fn create_turn(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTurnBody>,
) -> Result<(StatusCode, Json<TurnResponse>), impl IntoResponse> {
    let request = CreateTurnRequest {
        sector_id: body.sector_id,
        citizen_id: body.citizen_id,
        kind: body.kind.unwrap_or(TurnKind::Normal),
        priority: body.priority.unwrap_or(0),
    };

    match state.service().create_turn(request).await {
        Ok(turn) => {
            TURNS_CREATED_TOTAL.inc();
            Ok((StatusCode::CREATED, Json(TurnResponse::from(turn))))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Get a turn by ID, falling back to its display code
pub async fn get_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TurnResponse>, impl IntoResponse> {
    let found = state
        .service()
        .get(&id)
        .and_then(|turn| match turn {
            Some(t) => Ok(Some(t)),
            None => state.service().get_by_code(&id),
        });

    match found {
        Ok(Some(turn)) => Ok(Json(TurnResponse::from(turn))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("turn not found: {}", id),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// Begin serving a called turn
pub async fn start_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<OperatorActionBody>,
) -> Result<Json<TurnResponse>, impl IntoResponse> {
    match state.service().start_service(&id, &body.employee_id).await {
        Ok(turn) => {
            TURN_STATE_TRANSITIONS
                .with_label_values(&["called", turn.state.as_str()])
                .inc();
            Ok(Json(TurnResponse::from(turn)))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Complete service for a turn
pub async fn finish_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<OperatorActionBody>,
) -> Result<Json<TurnResponse>, impl IntoResponse> {
    match state
        .service()
        .finish(&id, &body.employee_id, body.notes)
        .await
    {
        Ok(turn) => {
            TURN_STATE_TRANSITIONS
                .with_label_values(&["in_service", turn.state.as_str()])
                .inc();
            Ok(Json(TurnResponse::from(turn)))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Mark a called turn as absent
pub async fn absent_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<OperatorActionBody>,
) -> Result<Json<TurnResponse>, impl IntoResponse> {
    match state
        .service()
        .mark_absent(&id, &body.employee_id, body.notes)
        .await
    {
        Ok(turn) => {
            TURN_STATE_TRANSITIONS
                .with_label_values(&["called", turn.state.as_str()])
                .inc();
            Ok(Json(TurnResponse::from(turn)))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Redirect a turn to another sector
pub async fn redirect_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RedirectBody>,
) -> Result<Json<TurnResponse>, impl IntoResponse> {
    match state
        .service()
        .redirect(&id, &body.to_sector_id, &body.employee_id, body.reason)
        .await
    {
        Ok(turn) => {
            REDIRECTS_TOTAL.with_label_values(&[&turn.sector_id]).inc();
            Ok(Json(TurnResponse::from(turn)))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Withdraw a turn
pub async fn cancel_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<TurnResponse>, impl IntoResponse> {
    let (employee_id, reason) = body
        .map(|Json(b)| (b.employee_id, b.reason))
        .unwrap_or((None, None));
    let prior_state = state
        .service()
        .get(&id)
        .ok()
        .flatten()
        .map(|t| t.state);

    match state
        .service()
        .cancel(&id, employee_id.as_deref(), reason)
        .await
    {
        Ok(turn) => {
            if let Some(from) = prior_state {
                TURN_STATE_TRANSITIONS
                    .with_label_values(&[from.as_str(), turn.state.as_str()])
                    .inc();
            }
            Ok(Json(TurnResponse::from(turn)))
        }
        Err(e) => Err(error_response(e)),
    }
}
