use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::DiscussionStatus;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::discussions::{DiscussionFilters, DiscussionService, NewDiscussion};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateDiscussionRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<DiscussionStatus>,
    pub tag: Option<String>,
}

/// POST /api/discussions (citizen only)
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<CreateDiscussionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = DiscussionService::new(state.pool.clone());
    let discussion = service
        .create(
            &actor,
            NewDiscussion {
                title: payload.title,
                description: payload.description,
                tags: payload.tags,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": discussion })),
    ))
}

/// GET /api/discussions - role-scoped listing with status/tag filters
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = DiscussionService::new(state.pool.clone());
    let discussions = service
        .list(
            &actor,
            DiscussionFilters {
                status: query.status,
                tag: query.tag,
            },
        )
        .await?;
    Ok(Json(json!({ "success": true, "data": discussions })))
}

/// GET /api/discussions/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = DiscussionService::new(state.pool.clone());
    let (discussion, comments) = service.get(&actor, id).await?;
    Ok(Json(json!({
        "success": true,
        "data": { "discussion": discussion, "comments": comments }
    })))
}

/// POST /api/discussions/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = DiscussionService::new(state.pool.clone());
    let comment = service.add_comment(&actor, id, &payload.text).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": comment })),
    ))
}

/// PATCH /api/discussions/:id/resolve (sector/district admin in jurisdiction)
pub async fn resolve(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = DiscussionService::new(state.pool.clone());
    let discussion = service.resolve(&actor, id).await?;
    Ok(Json(json!({ "success": true, "data": discussion })))
}
