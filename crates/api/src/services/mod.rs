//! Business logic shared by the HTTP handlers.
//!
//! - [`auth::AuthService`] -- registration, login, refresh rotation, logout.
//! - [`directory::Directory`] -- user and session administration under the
//!   role hierarchy.

pub mod auth;
pub mod directory;

use crate::auth::password;
use crate::error::{AppError, AppResult};

/// Hash a password on the blocking pool.
async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::InternalError(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}

/// Verify a password on the blocking pool.
async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalError(format!("Password verification task failed: {e}")))?
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))
}
