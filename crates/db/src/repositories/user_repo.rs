//! Repository for the `users` table.

use gatehouse_core::search::escape_like;
use gatehouse_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, role, status, created_at, \
                       last_active_at, total_active_time";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(conn: &mut PgConnection, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, role, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role.as_str())
            .bind(&input.status)
            .fetch_one(conn)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a user by email (case-sensitive, matching the unique constraint).
    pub async fn find_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(conn)
            .await
    }

    /// List users, most recently created first.
    ///
    /// `search` matches a case-insensitive substring of the email with `%`
    /// and `_` taken literally.
    pub async fn list(
        conn: &mut PgConnection,
        filter: &UserFilter,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE ($1::text IS NULL OR email ILIKE '%' || $1 || '%')
               AND ($2::text IS NULL OR role = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(filter.search.as_deref().map(escape_like))
            .bind(filter.role.map(|r| r.as_str()))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(conn)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                role = COALESCE($2, role),
                status = COALESCE($3, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(input.role.map(|r| r.as_str()))
            .bind(&input.status)
            .fetch_optional(conn)
            .await
    }

    /// Delete a user. Refresh tokens and login sessions cascade.
    ///
    /// Returns `true` if the row existed.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp activity: set `last_active_at` and add `quantum_secs` to the
    /// running total. Returns `true` if the user exists.
    pub async fn record_activity(
        conn: &mut PgConnection,
        id: DbId,
        at: Timestamp,
        quantum_secs: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET
                last_active_at = $2,
                total_active_time = total_active_time + $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .bind(quantum_secs)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
