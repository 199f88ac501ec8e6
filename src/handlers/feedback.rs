use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::database::models::ServiceType;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::feedback::{FeedbackService, NewFeedback};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitFeedbackRequest {
    pub service_type: ServiceType,
    pub rating: i16,
    pub comments: Option<String>,
}

/// POST /api/feedback (citizen only)
pub async fn submit(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(payload): Json<SubmitFeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = FeedbackService::new(state.pool.clone());
    let feedback = service
        .submit(
            &actor,
            NewFeedback {
                service_type: payload.service_type,
                rating: payload.rating,
                comments: payload.comments,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": feedback })),
    ))
}

/// GET /api/feedback/analytics (admin roles, jurisdiction-scoped)
pub async fn analytics(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let service = FeedbackService::new(state.pool.clone());
    let stats = service.analytics(&actor).await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}
