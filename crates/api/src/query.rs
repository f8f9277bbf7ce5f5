//! Shared query parameter types for API handlers.

use gatehouse_core::roles::Role;
use serde::Deserialize;

/// Query parameters for `GET /admin/users` (`?skip=&limit=&search=&role=`).
///
/// `skip` and `limit` are clamped by the directory via `clamp_offset` /
/// `clamp_limit`; a blank `search` is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub role: Option<Role>,
}
