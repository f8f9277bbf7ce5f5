//! Login session model and DTOs.

use gatehouse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `login_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoginSession {
    pub id: DbId,
    #[serde(skip)]
    pub user_id: DbId,
    #[serde(skip)]
    pub refresh_token_id: DbId,
    pub ip_address: Option<String>,
    #[serde(skip)]
    pub user_agent: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub login_at: Timestamp,
    pub last_activity_at: Timestamp,
}

/// DTO for recording a new login.
#[derive(Debug, Clone, Default)]
pub struct CreateLoginSession {
    pub user_id: DbId,
    pub refresh_token_id: DbId,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
}

/// Activity on an existing session, applied when its credential rotates.
///
/// Each client field replaces the stored value only when present.
#[derive(Debug, Clone)]
pub struct TouchLoginSession {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub at: Timestamp,
}
