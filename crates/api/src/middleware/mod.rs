//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`client::ClientMeta`] -- Client IP and user agent for session bookkeeping.

pub mod auth;
pub mod client;
pub mod rbac;
