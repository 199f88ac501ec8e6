use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::report::ReportFilters;
use crate::database::models::ComplaintStatus;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::reports::ReportService;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReportQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub district: Option<String>,
    pub sector: Option<String>,
    pub status: Option<ComplaintStatus>,
    pub escalation_level: Option<i16>,
}

impl From<ReportQuery> for ReportFilters {
    fn from(query: ReportQuery) -> Self {
        ReportFilters {
            from: query.from,
            to: query.to,
            district: query.district,
            sector: query.sector,
            status: query.status,
            escalation_level: query.escalation_level,
        }
    }
}

/// GET /api/reports/complaints
pub async fn complaints(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ReportService::new(state.pool.clone());
    let report = service.complaints(&actor, query.into()).await?;
    Ok(Json(json!({ "success": true, "data": report })))
}

/// GET /api/reports/feedback
pub async fn feedback(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ReportService::new(state.pool.clone());
    let report = service.feedback(&actor, query.into()).await?;
    Ok(Json(json!({ "success": true, "data": report })))
}

/// GET /api/reports/engagement
pub async fn engagement(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ReportService::new(state.pool.clone());
    let report = service.engagement(&actor, query.into()).await?;
    Ok(Json(json!({ "success": true, "data": report })))
}

/// GET /api/reports/performance
pub async fn performance(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ReportService::new(state.pool.clone());
    let report = service.performance(&actor, query.into()).await?;
    Ok(Json(json!({ "success": true, "data": report })))
}

/// GET /api/reports/:id/csv - re-render a persisted snapshot
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ReportService::new(state.pool.clone());
    let csv = service.export_csv(&actor, id).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"report-{}.csv\"", id),
            ),
        ],
        csv,
    ))
}
