//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gatehouse_core::error::CoreError;
use gatehouse_core::roles::{Actor, Role};
use gatehouse_core::types::DbId;

use crate::auth::jwt::TokenKind;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Only access tokens authenticate; a refresh token presented here is
/// rejected like any other invalid token. Identity comes from the claims
/// alone, without a database round-trip.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub role: Role,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

fn invalid_token() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = state.codec.verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "Bearer token rejected");
            invalid_token()
        })?;
        if claims.kind != TokenKind::Access {
            return Err(invalid_token());
        }

        let user_id = claims.subject_id().ok_or_else(invalid_token)?;
        let role = claims.role.ok_or_else(invalid_token)?;

        Ok(AuthUser { user_id, role })
    }
}
