use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{ComplaintStatus, Location};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::complaints::{ComplaintService, NewComplaint};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateComplaintRequest {
    pub title: String,
    pub description: String,
    pub location: Location,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<ComplaintStatus>,
}

/// POST /api/complaints (citizen only)
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<CreateComplaintRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ComplaintService::new(state.pool.clone());
    let complaint = service
        .submit(
            &actor,
            NewComplaint {
                title: payload.title,
                description: payload.description,
                location: payload.location,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": complaint })),
    ))
}

/// GET /api/complaints - role-scoped listing
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ComplaintService::new(state.pool.clone());
    let complaints = service.list_for(&actor, query.status).await?;
    Ok(Json(json!({ "success": true, "data": complaints })))
}

/// GET /api/complaints/sector - assigned queue for sector admins
pub async fn sector_queue(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ComplaintService::new(state.pool.clone());
    let complaints = service.sector_queue(&actor).await?;
    Ok(Json(json!({ "success": true, "data": complaints })))
}

/// GET /api/complaints/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ComplaintService::new(state.pool.clone());
    let complaint = service.get(&actor, id).await?;
    Ok(Json(json!({ "success": true, "data": complaint })))
}

/// PUT /api/complaints/:id/escalate (sector admin only)
pub async fn escalate(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ComplaintService::new(state.pool.clone());
    let complaint = service.escalate(&actor, id).await?;
    Ok(Json(json!({ "success": true, "data": complaint })))
}

/// PUT /api/complaints/:id/resolve (assigned sector/district admin)
pub async fn resolve(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ComplaintService::new(state.pool.clone());
    let complaint = service.resolve(&actor, id).await?;
    Ok(Json(json!({ "success": true, "data": complaint })))
}

/// GET /api/complaints/admin/dashboard (super admin only)
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ComplaintService::new(state.pool.clone());
    let counts = service.dashboard().await?;
    Ok(Json(json!({ "success": true, "data": counts })))
}
