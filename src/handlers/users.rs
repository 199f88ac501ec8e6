use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{Location, Role};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::users::UserService;
use crate::state::AppState;

/// GET /api/users/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> impl IntoResponse {
    Json(json!({ "success": true, "data": user }))
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
    pub location: Option<Location>,
}

/// PATCH /api/users/:id/role - strictly-higher-rank promotion/demotion.
pub async fn change_role(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(target_id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new(state.pool.clone());
    let user = service
        .promote(&actor, target_id, payload.role, payload.location)
        .await?;

    Ok(Json(json!({ "success": true, "data": user })))
}
