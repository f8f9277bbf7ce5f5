//! Storage traits used by the service layer.
//!
//! All reads and writes go through a [`StoreTx`] obtained from
//! [`Store::begin`]. A transaction that is dropped without
//! [`StoreTx::commit`] is rolled back, so an early return with `?` never
//! leaves a half-applied change behind.

use async_trait::async_trait;
use gatehouse_core::types::{DbId, Timestamp};

use crate::error::DbError;
use crate::models::login_session::{CreateLoginSession, LoginSession, TouchLoginSession};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};

/// Entry point to persistence. Cheap to share behind an `Arc`.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Start a unit of work.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DbError>;

    /// Verify the backing store is reachable.
    async fn health_check(&self) -> Result<(), DbError>;
}

/// An open unit of work.
#[async_trait]
pub trait StoreTx: UserStore + TokenStore + SessionStore + Send {
    async fn commit(self: Box<Self>) -> Result<(), DbError>;
}

#[async_trait]
pub trait UserStore {
    /// Fails with [`DbError::UniqueViolation`] on a duplicate email.
    async fn create_user(&mut self, input: &CreateUser) -> Result<User, DbError>;
    async fn find_user(&mut self, id: DbId) -> Result<Option<User>, DbError>;
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError>;
    async fn list_users(&mut self, filter: &UserFilter) -> Result<Vec<User>, DbError>;
    async fn update_user(&mut self, id: DbId, input: &UpdateUser)
        -> Result<Option<User>, DbError>;
    /// Cascades to the user's refresh tokens and login sessions.
    async fn delete_user(&mut self, id: DbId) -> Result<bool, DbError>;
    async fn record_activity(
        &mut self,
        id: DbId,
        at: Timestamp,
        quantum_secs: i64,
    ) -> Result<bool, DbError>;
}

#[async_trait]
pub trait TokenStore {
    async fn insert_refresh_token(
        &mut self,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, DbError>;
    async fn find_refresh_token(&mut self, token_hash: &str)
        -> Result<Option<RefreshToken>, DbError>;
    async fn list_refresh_tokens(&mut self, user_id: DbId) -> Result<Vec<RefreshToken>, DbError>;
    /// Conditional in-place rotation keyed on the current digest. `None`
    /// means the row no longer holds `current_hash`.
    async fn rotate_refresh_token(
        &mut self,
        id: DbId,
        current_hash: &str,
        new_hash: &str,
        expires_at: i64,
    ) -> Result<Option<RefreshToken>, DbError>;
    /// Cascades to the credential's login session.
    async fn delete_refresh_token(&mut self, id: DbId) -> Result<bool, DbError>;
    async fn delete_user_refresh_tokens(&mut self, user_id: DbId) -> Result<u64, DbError>;
}

#[async_trait]
pub trait SessionStore {
    async fn create_login_session(
        &mut self,
        input: &CreateLoginSession,
    ) -> Result<LoginSession, DbError>;
    async fn find_login_session(
        &mut self,
        refresh_token_id: DbId,
    ) -> Result<Option<LoginSession>, DbError>;
    async fn touch_login_session(
        &mut self,
        refresh_token_id: DbId,
        input: &TouchLoginSession,
    ) -> Result<Option<LoginSession>, DbError>;
    async fn list_login_sessions(&mut self, user_ids: &[DbId])
        -> Result<Vec<LoginSession>, DbError>;
}
