//! [`Store`] implementation backed by a Postgres pool.

use async_trait::async_trait;
use gatehouse_core::types::{DbId, Timestamp};
use sqlx::{Postgres, Transaction};

use crate::error::DbError;
use crate::models::login_session::{CreateLoginSession, LoginSession, TouchLoginSession};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};
use crate::repositories::{LoginSessionRepo, RefreshTokenRepo, UserRepo};
use crate::store::{SessionStore, Store, StoreTx, TokenStore, UserStore};
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DbError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn health_check(&self) -> Result<(), DbError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}

/// A Postgres transaction. `sqlx` rolls it back when dropped uncommitted.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgTx {
    async fn create_user(&mut self, input: &CreateUser) -> Result<User, DbError> {
        Ok(UserRepo::create(&mut *self.tx, input).await?)
    }

    async fn find_user(&mut self, id: DbId) -> Result<Option<User>, DbError> {
        Ok(UserRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError> {
        Ok(UserRepo::find_by_email(&mut *self.tx, email).await?)
    }

    async fn list_users(&mut self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        Ok(UserRepo::list(&mut *self.tx, filter).await?)
    }

    async fn update_user(
        &mut self,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, DbError> {
        Ok(UserRepo::update(&mut *self.tx, id, input).await?)
    }

    async fn delete_user(&mut self, id: DbId) -> Result<bool, DbError> {
        Ok(UserRepo::delete(&mut *self.tx, id).await?)
    }

    async fn record_activity(
        &mut self,
        id: DbId,
        at: Timestamp,
        quantum_secs: i64,
    ) -> Result<bool, DbError> {
        Ok(UserRepo::record_activity(&mut *self.tx, id, at, quantum_secs).await?)
    }
}

#[async_trait]
impl TokenStore for PgTx {
    async fn insert_refresh_token(
        &mut self,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, DbError> {
        Ok(RefreshTokenRepo::create(&mut *self.tx, input).await?)
    }

    async fn find_refresh_token(
        &mut self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, DbError> {
        Ok(RefreshTokenRepo::find_by_hash(&mut *self.tx, token_hash).await?)
    }

    async fn list_refresh_tokens(&mut self, user_id: DbId) -> Result<Vec<RefreshToken>, DbError> {
        Ok(RefreshTokenRepo::list_for_user(&mut *self.tx, user_id).await?)
    }

    async fn rotate_refresh_token(
        &mut self,
        id: DbId,
        current_hash: &str,
        new_hash: &str,
        expires_at: i64,
    ) -> Result<Option<RefreshToken>, DbError> {
        Ok(RefreshTokenRepo::rotate(&mut *self.tx, id, current_hash, new_hash, expires_at).await?)
    }

    async fn delete_refresh_token(&mut self, id: DbId) -> Result<bool, DbError> {
        Ok(RefreshTokenRepo::delete(&mut *self.tx, id).await?)
    }

    async fn delete_user_refresh_tokens(&mut self, user_id: DbId) -> Result<u64, DbError> {
        Ok(RefreshTokenRepo::delete_all_for_user(&mut *self.tx, user_id).await?)
    }
}

#[async_trait]
impl SessionStore for PgTx {
    async fn create_login_session(
        &mut self,
        input: &CreateLoginSession,
    ) -> Result<LoginSession, DbError> {
        Ok(LoginSessionRepo::create(&mut *self.tx, input).await?)
    }

    async fn find_login_session(
        &mut self,
        refresh_token_id: DbId,
    ) -> Result<Option<LoginSession>, DbError> {
        Ok(LoginSessionRepo::find_by_refresh_token(&mut *self.tx, refresh_token_id).await?)
    }

    async fn touch_login_session(
        &mut self,
        refresh_token_id: DbId,
        input: &TouchLoginSession,
    ) -> Result<Option<LoginSession>, DbError> {
        Ok(LoginSessionRepo::touch(&mut *self.tx, refresh_token_id, input).await?)
    }

    async fn list_login_sessions(
        &mut self,
        user_ids: &[DbId],
    ) -> Result<Vec<LoginSession>, DbError> {
        Ok(LoginSessionRepo::list_for_users(&mut *self.tx, user_ids).await?)
    }
}
