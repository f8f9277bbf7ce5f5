use crate::types::DbId;

/// Domain error shared by the stores, the auth core and the directory.
///
/// Each variant maps to exactly one HTTP status at the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials or an invalid, expired or reused token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Role-hierarchy violation on an existing resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}
