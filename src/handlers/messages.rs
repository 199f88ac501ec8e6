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
use crate::services::messages::MessageService;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub body: String,
}

/// POST /api/messages
pub async fn send(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = MessageService::new(state.pool.clone());
    let message = service
        .send(&actor, payload.receiver_id, &payload.body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": message })),
    ))
}

/// GET /api/messages/:id - conversation with the given user
pub async fn conversation(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(other_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = MessageService::new(state.pool.clone());
    let messages = service.conversation(&actor, other_id).await?;
    Ok(Json(json!({ "success": true, "data": messages })))
}

/// PATCH /api/messages/:id/read (recipient only)
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = MessageService::new(state.pool.clone());
    let message = service.mark_read(&actor, id).await?;
    Ok(Json(json!({ "success": true, "data": message })))
}
