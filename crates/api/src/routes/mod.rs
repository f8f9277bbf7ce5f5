pub mod admin;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /register                          register (public)
/// /login                             login (public)
/// /refresh                           refresh (public)
/// /logout                            logout one refresh token (public)
/// /logout-all                        logout everywhere (requires auth)
/// /me                                own profile (requires auth)
///
/// /admin/users                       list, create (admin only)
/// /admin/users/{id}                  get, update, delete
/// /admin/users/{id}/logout-all       revoke a user's tokens
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/admin", admin::router())
}
