//! Handlers for the authenticated user's own profile.

use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::UserResponse;
use crate::state::AppState;

/// GET /api/v1/me
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let profile = state.directory.get_user(user.user_id).await?;
    Ok(Json(profile))
}
