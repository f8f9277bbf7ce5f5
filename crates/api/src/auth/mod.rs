//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- token codec for access and refresh JWTs, refresh-token hashing.

pub mod jwt;
pub mod password;
