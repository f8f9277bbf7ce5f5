//! Row types and DTOs for every table the service owns.

pub mod login_session;
pub mod refresh_token;
pub mod user;
