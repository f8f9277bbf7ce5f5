//! Handlers for registration, login, refresh and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use gatehouse_core::roles::Role;
use gatehouse_core::validation::DEFAULT_STATUS;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientMeta;
use crate::response::TokenResponse;
use crate::services::directory::NewUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Anything but `user` is rejected for anonymous callers.
    #[serde(default)]
    pub role: Role,
    pub status: Option<String>,
}

/// Request body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /refresh` and `DELETE /logout`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/register
pub async fn register(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let new_user = NewUser {
        email: input.email,
        password: input.password,
        role: input.role,
        status: input.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
    };
    let issued = state.auth.register(new_user, client).await?;
    Ok((StatusCode::CREATED, Json(issued.tokens)))
}

/// POST /api/v1/login
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let issued = state
        .auth
        .login(&input.email, &input.password, client)
        .await?;
    Ok(Json(issued.tokens))
}

/// POST /api/v1/refresh
///
/// Single use: the presented token stops working once this succeeds.
pub async fn refresh(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    Json(input): Json<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let issued = state.auth.refresh(&input.token, client).await?;
    Ok(Json(issued.tokens))
}

/// DELETE /api/v1/logout
///
/// Revoke one refresh token. Idempotent: unknown tokens also yield 204.
pub async fn logout(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> AppResult<StatusCode> {
    state.auth.logout(&input.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/logout-all
///
/// Revoke every refresh token of the authenticated user.
pub async fn logout_all(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    state.auth.logout_all(user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
