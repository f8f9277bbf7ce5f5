//! Route definitions for the `/admin` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /users                   -> list_users
/// POST   /users                   -> create_user
/// GET    /users/{id}              -> get_user
/// PUT    /users/{id}              -> update_user
/// DELETE /users/{id}              -> delete_user
/// DELETE /users/{id}/logout-all   -> logout_all
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/users/{id}/logout-all", delete(admin::logout_all))
}
