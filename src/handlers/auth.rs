use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::database::models::{Location, Role};
use crate::error::ApiError;
use crate::services::users::{NewUser, UserService};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Requesting anything but citizen is rejected; elevated accounts come
    /// from bootstrap or promotion.
    pub role: Option<Role>,
    pub location: Location,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new(state.pool.clone());
    let (user, token) = service
        .register(NewUser {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role: payload.role,
            location: payload.location,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": { "token": token, "user": user }
        })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = UserService::new(state.pool.clone());
    let (user, token) = service.login(&payload.email, &payload.password).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "token": token, "user": user }
    })))
}
