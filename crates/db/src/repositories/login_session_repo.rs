//! Repository for the `login_sessions` table.

use gatehouse_core::types::DbId;
use sqlx::PgConnection;

use crate::models::login_session::{CreateLoginSession, LoginSession, TouchLoginSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, refresh_token_id, ip_address, user_agent, \
                       device_type, browser, os, login_at, last_activity_at";

pub struct LoginSessionRepo;

impl LoginSessionRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateLoginSession,
    ) -> Result<LoginSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO login_sessions
                (user_id, refresh_token_id, ip_address, user_agent, device_type, browser, os)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoginSession>(&query)
            .bind(input.user_id)
            .bind(input.refresh_token_id)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(&input.device_type)
            .bind(&input.browser)
            .bind(&input.os)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_refresh_token(
        conn: &mut PgConnection,
        refresh_token_id: DbId,
    ) -> Result<Option<LoginSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM login_sessions WHERE refresh_token_id = $1");
        sqlx::query_as::<_, LoginSession>(&query)
            .bind(refresh_token_id)
            .fetch_optional(conn)
            .await
    }

    /// Record activity on the session tied to a refresh credential.
    ///
    /// Returns `None` if no session exists for that credential.
    pub async fn touch(
        conn: &mut PgConnection,
        refresh_token_id: DbId,
        input: &TouchLoginSession,
    ) -> Result<Option<LoginSession>, sqlx::Error> {
        let query = format!(
            "UPDATE login_sessions SET
                ip_address = COALESCE($2, ip_address),
                user_agent = COALESCE($3, user_agent),
                device_type = COALESCE($4, device_type),
                browser = COALESCE($5, browser),
                os = COALESCE($6, os),
                last_activity_at = $7
             WHERE refresh_token_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoginSession>(&query)
            .bind(refresh_token_id)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(&input.device_type)
            .bind(&input.browser)
            .bind(&input.os)
            .bind(input.at)
            .fetch_optional(conn)
            .await
    }

    /// All sessions belonging to any of `user_ids`, newest login first.
    pub async fn list_for_users(
        conn: &mut PgConnection,
        user_ids: &[DbId],
    ) -> Result<Vec<LoginSession>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM login_sessions
             WHERE user_id = ANY($1)
             ORDER BY login_at DESC, id DESC"
        );
        sqlx::query_as::<_, LoginSession>(&query)
            .bind(user_ids)
            .fetch_all(conn)
            .await
    }
}
