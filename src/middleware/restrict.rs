use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::CurrentUser;
use crate::database::models::Role;
use crate::error::ApiError;

/// Role allow-list middleware. Wire per route group with
/// `middleware::from_fn(|req, next| restrict_to(&[Role::Citizen], req, next))`
/// behind `protect`, which injects the current user.
pub async fn restrict_to(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let CurrentUser(user) = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !allowed.contains(&user.role) {
        return Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        ));
    }

    Ok(next.run(request).await)
}
