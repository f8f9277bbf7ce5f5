//! Handlers for the `/admin` resource (user management).
//!
//! All handlers require the `admin` role via [`RequireAdmin`]. The role
//! hierarchy still applies per target: an admin cannot modify another admin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use gatehouse_core::roles::Role;
use gatehouse_core::types::DbId;
use gatehouse_core::validation::DEFAULT_STATUS;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::UserListParams;
use crate::response::UserResponse;
use crate::services::directory::{NewUser, UserChanges};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub status: Option<String>,
}

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/users?skip=&limit=&search=&role=
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.directory.list_users(&params).await?;
    Ok(Json(users))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let new_user = NewUser {
        email: input.email,
        password: input.password,
        role: input.role,
        status: input.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
    };
    let user = state.directory.create_user(&admin.actor(), new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    let user = state.directory.get_user(id).await?;
    Ok(Json(user))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let changes = UserChanges {
        role: input.role,
        status: input.status,
    };
    let user = state
        .directory
        .update_user(&admin.actor(), id, changes)
        .await?;
    Ok(Json(user))
}

/// DELETE /api/v1/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.directory.delete_user(&admin.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/users/{id}/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.directory.logout_all(&admin.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
