use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::groups::{GroupService, NewGroup};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct AnnouncementRequest {
    pub message: String,
}

/// POST /api/groups (sector/district admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GroupService::new(state.pool.clone());
    let group = service
        .create(
            &actor,
            NewGroup {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": group })),
    ))
}

/// GET /api/groups - groups in the caller's jurisdiction
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GroupService::new(state.pool.clone());
    let groups = service.list(&actor).await?;
    Ok(Json(json!({ "success": true, "data": groups })))
}

/// GET /api/groups/:id (member only)
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GroupService::new(state.pool.clone());
    let (group, members) = service.get(&actor, id).await?;
    Ok(Json(json!({
        "success": true,
        "data": { "group": group, "members": members }
    })))
}

/// POST /api/groups/:id/join
pub async fn join(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GroupService::new(state.pool.clone());
    let member = service.join(&actor, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": member })),
    ))
}

/// POST /api/groups/:id/leave
pub async fn leave(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GroupService::new(state.pool.clone());
    service.leave(&actor, id).await?;
    Ok(Json(json!({ "success": true, "data": null })))
}

/// POST /api/groups/:id/announcements (creator only)
pub async fn post_announcement(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnnouncementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GroupService::new(state.pool.clone());
    let announcement = service
        .post_announcement(&actor, id, &payload.message)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": announcement })),
    ))
}

/// GET /api/groups/:id/announcements (member only)
pub async fn announcements(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GroupService::new(state.pool.clone());
    let announcements = service.announcements(&actor, id).await?;
    Ok(Json(json!({ "success": true, "data": announcements })))
}
