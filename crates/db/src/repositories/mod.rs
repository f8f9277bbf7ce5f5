//! Postgres repositories, one per table.
//!
//! Repositories are zero-sized structs whose methods take a connection, so
//! the same code runs against a pooled connection or inside a transaction.

pub mod login_session_repo;
pub mod refresh_token_repo;
pub mod user_repo;

pub use login_session_repo::LoginSessionRepo;
pub use refresh_token_repo::RefreshTokenRepo;
pub use user_repo::UserRepo;
