//! Route definitions for the credential endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{auth, me};
use crate::state::AppState;

/// Routes mounted at the `/api/v1` root.
///
/// ```text
/// POST   /register    -> register
/// POST   /login       -> login
/// POST   /refresh     -> refresh
/// DELETE /logout      -> logout
/// DELETE /logout-all  -> logout_all (requires auth)
/// GET    /me          -> get_me (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", delete(auth::logout))
        .route("/logout-all", delete(auth::logout_all))
        .route("/me", get(me::get_me))
}
