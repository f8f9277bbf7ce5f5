//! Repository for the `refresh_tokens` table.

use gatehouse_core::types::DbId;
use sqlx::PgConnection;

use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token_hash, expires_at, created_at";

pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .fetch_one(conn)
            .await
    }

    /// Look up a credential by token digest. Expired rows are still returned;
    /// the caller decides what to do with them.
    pub async fn find_by_hash(
        conn: &mut PgConnection,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM refresh_tokens WHERE token_hash = $1");
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<Vec<RefreshToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM refresh_tokens WHERE user_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(user_id)
            .fetch_all(conn)
            .await
    }

    /// Replace the token digest and expiry of an existing row, but only if it
    /// still holds `current_hash`.
    ///
    /// Returns `None` when the row was already rotated or deleted, so two
    /// concurrent rotations of the same token cannot both succeed.
    pub async fn rotate(
        conn: &mut PgConnection,
        id: DbId,
        current_hash: &str,
        new_hash: &str,
        expires_at: i64,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!(
            "UPDATE refresh_tokens SET token_hash = $3, expires_at = $4
             WHERE id = $1 AND token_hash = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(id)
            .bind(current_hash)
            .bind(new_hash)
            .bind(expires_at)
            .fetch_optional(conn)
            .await
    }

    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every credential owned by a user. Returns the number deleted.
    pub async fn delete_all_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
