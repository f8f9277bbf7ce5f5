//! Storage error type shared by the Postgres and in-memory stores.

/// Error returned by every store operation.
///
/// Constraint violations are lifted out of [`sqlx::Error`] so callers can
/// react to them without matching on Postgres error codes.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `uq_*` unique constraint rejected the write.
    #[error("Duplicate value violates unique constraint: {0}")]
    UniqueViolation(String),

    /// A foreign key referenced a row that does not exist (or no longer does).
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) if constraint.starts_with("uq_") => {
                    return DbError::UniqueViolation(constraint);
                }
                Some(FOREIGN_KEY_VIOLATION) => return DbError::ForeignKeyViolation(constraint),
                _ => {}
            }
        }
        DbError::Sqlx(err)
    }
}
