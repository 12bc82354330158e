//! Sector API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ventanilla_core::Sector;

use crate::api::turns::{error_response, ErrorResponse, TurnResponse};
use crate::metrics::{CLAIMS_EMPTY_TOTAL, CLAIMS_TOTAL};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SectorResponse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<u32>,
}

impl From<Sector> for SectorResponse {
    fn from(sector: Sector) -> Self {
        Self {
            id: sector.id,
            code: sector.code,
            name: sector.name,
            active: sector.active,
            max_capacity: sector.max_capacity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub sector_id: String,
    pub pending: usize,
    pub turns: Vec<TurnResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimBody {
    pub employee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveBody {
    pub active: bool,
    pub employee_id: Option<String>,
}

/// List all sectors
pub async fn list_sectors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SectorResponse>>, impl IntoResponse> {
    match state.service().list_sectors() {
        Ok(sectors) => Ok(Json(
            sectors.into_iter().map(SectorResponse::from).collect(),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// Get a single sector
pub async fn get_sector(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SectorResponse>, impl IntoResponse> {
    match state.service().get_sector(&id) {
        Ok(Some(sector)) => Ok(Json(SectorResponse::from(sector))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("sector not found: {}", id),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// Pending turns of a sector, in the order they would be claimed
pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QueueResponse>, impl IntoResponse> {
    match state.service().queue(&id) {
        Ok(turns) => Ok(Json(QueueResponse {
            sector_id: id,
            pending: turns.len(),
            turns: turns.into_iter().map(TurnResponse::from).collect(),
        })),
        Err(e) => Err(error_response(e)),
    }
}

/// Claim the next pending turn for an operator.
///
/// Returns 204 when the queue is empty.
pub async fn claim_next(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ClaimBody>,
) -> Result<axum::response::Response, impl IntoResponse> {
    match state.service().claim_next(&id, &body.employee_id).await {
        Ok(Some(turn)) => {
            CLAIMS_TOTAL.with_label_values(&[&turn.sector_id]).inc();
            Ok(Json(TurnResponse::from(turn)).into_response())
        }
        Ok(None) => {
            CLAIMS_EMPTY_TOTAL.inc();
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Open or close a sector for new turns
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SetActiveBody>,
) -> Result<Json<SectorResponse>, impl IntoResponse> {
    if let Err(e) = state
        .service()
        .set_sector_active(&id, body.active, body.employee_id.as_deref())
        .await
    {
        return Err(error_response(e));
    }

    match state.service().get_sector(&id) {
        Ok(Some(sector)) => Ok(Json(SectorResponse::from(sector))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("sector not found: {}", id),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}
