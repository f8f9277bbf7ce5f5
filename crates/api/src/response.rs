//! Shared response types for API handlers.

use gatehouse_core::roles::Role;
use gatehouse_core::types::{DbId, Timestamp};
use gatehouse_db::models::login_session::LoginSession;
use gatehouse_db::models::user::User;
use serde::Serialize;

use crate::auth::jwt::TokenPair;

/// Body returned by register, login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"bearer"`.
    pub token_type: &'static str,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer",
        }
    }
}

/// Public view of a user, with their login sessions and derived presence.
///
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub role: Role,
    pub status: String,
    pub created_at: Timestamp,
    pub last_active_at: Option<Timestamp>,
    /// Cumulative active time in seconds.
    pub total_active_time: i64,
    pub login_sessions: Vec<LoginSession>,
    pub online: bool,
}

impl UserResponse {
    pub fn new(user: User, login_sessions: Vec<LoginSession>, online: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            last_active_at: user.last_active_at,
            total_active_time: user.total_active_time,
            login_sessions,
            online,
        }
    }
}
