//! Audit trail query endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ventanilla_core::audit::{AuditFilter, AuditRecord};

use crate::api::turns::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub turn_id: Option<String>,
    pub event_type: Option<String>,
    pub employee_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub events: Vec<AuditRecord>,
}

/// Query the audit trail, newest first
pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQuery>,
) -> Result<Json<AuditResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = AuditFilter::new().with_time_range(params.from, params.to);
    if let Some(turn_id) = params.turn_id {
        filter = filter.with_turn_id(turn_id);
    }
    if let Some(event_type) = params.event_type {
        filter = filter.with_event_type(event_type);
    }
    if let Some(employee_id) = params.employee_id {
        filter = filter.with_employee_id(employee_id);
    }

    let total = match state.audit_store().count(&filter) {
        Ok(n) => n,
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    };

    let paged = filter.with_limit(limit).with_offset(offset);
    match state.audit_store().query(&paged) {
        Ok(events) => Ok(Json(AuditResponse {
            total,
            limit,
            offset,
            events,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
