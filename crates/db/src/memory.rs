//! In-process [`Store`] used by tests and local tooling.
//!
//! Transactions take an owned lock on the whole state and work on a copy of
//! it, so they are fully serialized: `commit` swaps the copy in, dropping the
//! transaction discards it. Unique constraints and cascades mirror the
//! Postgres schema.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use gatehouse_core::types::{DbId, Timestamp};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::DbError;
use crate::models::login_session::{CreateLoginSession, LoginSession, TouchLoginSession};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};
use crate::store::{SessionStore, Store, StoreTx, TokenStore, UserStore};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    refresh_tokens: BTreeMap<DbId, RefreshToken>,
    login_sessions: BTreeMap<DbId, LoginSession>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn delete_token_cascade(&mut self, token_id: DbId) -> bool {
        let existed = self.refresh_tokens.remove(&token_id).is_some();
        self.login_sessions.retain(|_, s| s.refresh_token_id != token_id);
        existed
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DbError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn health_check(&self) -> Result<(), DbError> {
        Ok(())
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryTx {
    async fn create_user(&mut self, input: &CreateUser) -> Result<User, DbError> {
        let state = &mut self.working;
        if state.users.values().any(|u| u.email == input.email) {
            return Err(DbError::UniqueViolation("uq_users_email".into()));
        }
        let user = User {
            id: state.allocate_id(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role,
            status: input.status.clone(),
            created_at: Utc::now(),
            last_active_at: None,
            total_active_time: 0,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&mut self, id: DbId) -> Result<Option<User>, DbError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&mut self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut users: Vec<User> = self
            .working
            .users
            .values()
            .filter(|u| {
                needle
                    .as_ref()
                    .map_or(true, |n| u.email.to_lowercase().contains(n.as_str()))
            })
            .filter(|u| filter.role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn update_user(
        &mut self,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, DbError> {
        let Some(user) = self.working.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(status) = &input.status {
            user.status = status.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&mut self, id: DbId) -> Result<bool, DbError> {
        let state = &mut self.working;
        let existed = state.users.remove(&id).is_some();
        state.refresh_tokens.retain(|_, t| t.user_id != id);
        state.login_sessions.retain(|_, s| s.user_id != id);
        Ok(existed)
    }

    async fn record_activity(
        &mut self,
        id: DbId,
        at: Timestamp,
        quantum_secs: i64,
    ) -> Result<bool, DbError> {
        let Some(user) = self.working.users.get_mut(&id) else {
            return Ok(false);
        };
        user.last_active_at = Some(at);
        user.total_active_time += quantum_secs;
        Ok(true)
    }
}

#[async_trait]
impl TokenStore for MemoryTx {
    async fn insert_refresh_token(
        &mut self,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, DbError> {
        let state = &mut self.working;
        if !state.users.contains_key(&input.user_id) {
            return Err(DbError::ForeignKeyViolation(
                "refresh_tokens_user_id_fkey".into(),
            ));
        }
        if state
            .refresh_tokens
            .values()
            .any(|t| t.token_hash == input.token_hash)
        {
            return Err(DbError::UniqueViolation(
                "uq_refresh_tokens_token_hash".into(),
            ));
        }
        let token = RefreshToken {
            id: state.allocate_id(),
            user_id: input.user_id,
            token_hash: input.token_hash.clone(),
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        state.refresh_tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_refresh_token(
        &mut self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, DbError> {
        Ok(self
            .working
            .refresh_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn list_refresh_tokens(&mut self, user_id: DbId) -> Result<Vec<RefreshToken>, DbError> {
        Ok(self
            .working
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn rotate_refresh_token(
        &mut self,
        id: DbId,
        current_hash: &str,
        new_hash: &str,
        expires_at: i64,
    ) -> Result<Option<RefreshToken>, DbError> {
        let state = &mut self.working;
        if state
            .refresh_tokens
            .values()
            .any(|t| t.id != id && t.token_hash == new_hash)
        {
            return Err(DbError::UniqueViolation(
                "uq_refresh_tokens_token_hash".into(),
            ));
        }
        match state.refresh_tokens.get_mut(&id) {
            Some(token) if token.token_hash == current_hash => {
                token.token_hash = new_hash.to_string();
                token.expires_at = expires_at;
                Ok(Some(token.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_refresh_token(&mut self, id: DbId) -> Result<bool, DbError> {
        Ok(self.working.delete_token_cascade(id))
    }

    async fn delete_user_refresh_tokens(&mut self, user_id: DbId) -> Result<u64, DbError> {
        let ids: Vec<DbId> = self
            .working
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.id)
            .collect();
        for id in &ids {
            self.working.delete_token_cascade(*id);
        }
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl SessionStore for MemoryTx {
    async fn create_login_session(
        &mut self,
        input: &CreateLoginSession,
    ) -> Result<LoginSession, DbError> {
        let state = &mut self.working;
        if !state.users.contains_key(&input.user_id) {
            return Err(DbError::ForeignKeyViolation(
                "login_sessions_user_id_fkey".into(),
            ));
        }
        if !state.refresh_tokens.contains_key(&input.refresh_token_id) {
            return Err(DbError::ForeignKeyViolation(
                "login_sessions_refresh_token_id_fkey".into(),
            ));
        }
        if state
            .login_sessions
            .values()
            .any(|s| s.refresh_token_id == input.refresh_token_id)
        {
            return Err(DbError::UniqueViolation(
                "uq_login_sessions_refresh_token_id".into(),
            ));
        }
        let now = Utc::now();
        let session = LoginSession {
            id: state.allocate_id(),
            user_id: input.user_id,
            refresh_token_id: input.refresh_token_id,
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            device_type: input.device_type.clone(),
            browser: input.browser.clone(),
            os: input.os.clone(),
            login_at: now,
            last_activity_at: now,
        };
        state.login_sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_login_session(
        &mut self,
        refresh_token_id: DbId,
    ) -> Result<Option<LoginSession>, DbError> {
        Ok(self
            .working
            .login_sessions
            .values()
            .find(|s| s.refresh_token_id == refresh_token_id)
            .cloned())
    }

    async fn touch_login_session(
        &mut self,
        refresh_token_id: DbId,
        input: &TouchLoginSession,
    ) -> Result<Option<LoginSession>, DbError> {
        let Some(session) = self
            .working
            .login_sessions
            .values_mut()
            .find(|s| s.refresh_token_id == refresh_token_id)
        else {
            return Ok(None);
        };
        let replace = |field: &mut Option<String>, value: &Option<String>| {
            if value.is_some() {
                field.clone_from(value);
            }
        };
        replace(&mut session.ip_address, &input.ip_address);
        replace(&mut session.user_agent, &input.user_agent);
        replace(&mut session.device_type, &input.device_type);
        replace(&mut session.browser, &input.browser);
        replace(&mut session.os, &input.os);
        session.last_activity_at = input.at;
        Ok(Some(session.clone()))
    }

    async fn list_login_sessions(
        &mut self,
        user_ids: &[DbId],
    ) -> Result<Vec<LoginSession>, DbError> {
        let mut sessions: Vec<LoginSession> = self
            .working
            .login_sessions
            .values()
            .filter(|s| user_ids.contains(&s.user_id))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.login_at.cmp(&a.login_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }
}
