//! User entity model and DTOs.

use gatehouse_core::roles::Role;
use gatehouse_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash, so it deliberately does not implement
/// `Serialize`. The API layer builds its own response type from it.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub status: String,
    pub created_at: Timestamp,
    pub last_active_at: Option<Timestamp>,
    /// Cumulative active time in seconds.
    pub total_active_time: i64,
}

impl User {
    /// Display label embedded in access tokens: the local part of the email.
    pub fn login(&self) -> &str {
        self.email
            .split_once('@')
            .map_or(self.email.as_str(), |(local, _)| local)
    }
}

/// DTO for inserting a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: String,
}

/// Partial update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub role: Option<Role>,
    pub status: Option<String>,
}

/// Listing filter. `search` is a raw substring; escaping happens in the store.
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub limit: i64,
    pub offset: i64,
}
