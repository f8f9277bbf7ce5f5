//! Refresh credential model and DTOs.

use gatehouse_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `refresh_tokens` table.
///
/// `token_hash` is the SHA-256 hex digest of the token handed to the client.
/// `expires_at` is in epoch seconds and is authoritative for expiry checks,
/// independently of the `exp` claim inside the token.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: i64,
    pub created_at: Timestamp,
}

impl RefreshToken {
    pub fn is_expired_at(&self, now_epoch_secs: i64) -> bool {
        self.expires_at < now_epoch_secs
    }
}

/// DTO for inserting a refresh credential.
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: i64,
}
