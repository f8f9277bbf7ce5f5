//! User and session administration.
//!
//! Every mutation loads the target first (so a missing user is reported as
//! `NotFound` before any permission decision), then applies the mutation
//! guard, then the escalation guard when a role is being assigned.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use gatehouse_core::error::CoreError;
use gatehouse_core::roles::{check_mutation, check_role_assignment, Actor, Role};
use gatehouse_core::search::{
    clamp_limit, clamp_offset, normalize_search, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};
use gatehouse_core::types::DbId;
use gatehouse_core::{presence, validation};
use gatehouse_db::models::login_session::LoginSession;
use gatehouse_db::models::user::{CreateUser, UpdateUser, User, UserFilter};
use gatehouse_db::{DbError, SessionStore, Store, StoreTx, TokenStore, UserStore};

use crate::error::{AppError, AppResult};
use crate::query::UserListParams;
use crate::response::UserResponse;

const EMAIL_TAKEN: &str = "User with this email already exists";

/// Input for creating an account, by self-registration or by an admin.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub status: String,
}

/// Partial update of an account. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub role: Option<Role>,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn Store>,
    /// Window within which a user counts as online; the access-token TTL.
    presence_window: Duration,
}

impl Directory {
    pub fn new(store: Arc<dyn Store>, presence_window: Duration) -> Self {
        Self {
            store,
            presence_window,
        }
    }

    pub async fn list_users(&self, params: &UserListParams) -> AppResult<Vec<UserResponse>> {
        let filter = UserFilter {
            search: normalize_search(params.search.as_deref()),
            role: params.role,
            limit: clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            offset: clamp_offset(params.skip),
        };

        let mut tx = self.store.begin().await?;
        let users = tx.list_users(&filter).await?;
        self.with_sessions(tx.as_mut(), users).await
    }

    pub async fn get_user(&self, id: DbId) -> AppResult<UserResponse> {
        let mut tx = self.store.begin().await?;
        let user = find_existing(tx.as_mut(), id).await?;
        self.with_sessions_one(tx.as_mut(), user).await
    }

    /// Create an account on behalf of `actor`.
    pub async fn create_user(&self, actor: &Actor, input: NewUser) -> AppResult<UserResponse> {
        let create = prepare_user(Some(actor), input).await?;
        let mut tx = self.store.begin().await?;
        let user = insert_user(tx.as_mut(), &create).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = user.id,
            role = %user.role,
            created_by = actor.id,
            "User created"
        );
        Ok(UserResponse::new(user, Vec::new(), false))
    }

    pub async fn update_user(
        &self,
        actor: &Actor,
        id: DbId,
        changes: UserChanges,
    ) -> AppResult<UserResponse> {
        let mut tx = self.store.begin().await?;
        let target = find_existing(tx.as_mut(), id).await?;
        check_mutation(actor, target.id, target.role)?;
        if let Some(role) = changes.role {
            check_role_assignment(Some(actor), Some(target.id), role)?;
        }
        if let Some(status) = &changes.status {
            validation::validate_status(status)?;
        }

        let update = UpdateUser {
            role: changes.role,
            status: changes.status,
        };
        let user = tx
            .update_user(id, &update)
            .await?
            .ok_or(CoreError::NotFound { entity: "User", id })?;
        let response = self.with_sessions_one(tx.as_mut(), user).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, updated_by = actor.id, "User updated");
        Ok(response)
    }

    /// Delete an account together with its credentials and sessions.
    pub async fn delete_user(&self, actor: &Actor, id: DbId) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let target = find_existing(tx.as_mut(), id).await?;
        check_mutation(actor, target.id, target.role)?;

        if !tx.delete_user(id).await? {
            return Err(CoreError::NotFound { entity: "User", id }.into());
        }
        tx.commit().await?;

        tracing::info!(user_id = id, deleted_by = actor.id, "User deleted");
        Ok(())
    }

    /// Revoke every refresh credential of `id`. Returns how many were revoked.
    pub async fn logout_all(&self, actor: &Actor, id: DbId) -> AppResult<u64> {
        let mut tx = self.store.begin().await?;
        let target = find_existing(tx.as_mut(), id).await?;
        check_mutation(actor, target.id, target.role)?;

        let revoked = tx.delete_user_refresh_tokens(id).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, revoked, revoked_by = actor.id, "Sessions revoked");
        Ok(revoked)
    }

    async fn with_sessions_one(
        &self,
        tx: &mut dyn StoreTx,
        user: User,
    ) -> AppResult<UserResponse> {
        let id = user.id;
        self.with_sessions(tx, vec![user])
            .await?
            .pop()
            .ok_or_else(|| CoreError::NotFound { entity: "User", id }.into())
    }

    /// Attach login sessions (one query for the whole page) and presence.
    async fn with_sessions(
        &self,
        tx: &mut dyn StoreTx,
        users: Vec<User>,
    ) -> AppResult<Vec<UserResponse>> {
        let ids: Vec<DbId> = users.iter().map(|u| u.id).collect();
        let mut sessions: HashMap<DbId, Vec<LoginSession>> = HashMap::new();
        for session in tx.list_login_sessions(&ids).await? {
            sessions.entry(session.user_id).or_default().push(session);
        }

        let now = Utc::now();
        Ok(users
            .into_iter()
            .map(|user| {
                let online = presence::is_online(user.last_active_at, now, self.presence_window);
                let user_sessions = sessions.remove(&user.id).unwrap_or_default();
                UserResponse::new(user, user_sessions, online)
            })
            .collect())
    }
}

/// Guard, validate and hash a new account. Runs outside any transaction so
/// no connection is held while the password is hashed.
///
/// `actor` is `None` for self-registration.
pub(crate) async fn prepare_user(actor: Option<&Actor>, input: NewUser) -> AppResult<CreateUser> {
    check_role_assignment(actor, None, input.role)?;
    validation::validate_email(&input.email)?;
    validation::validate_password(&input.password)?;
    validation::validate_status(&input.status)?;

    let password_hash = super::hash_password(input.password).await?;
    Ok(CreateUser {
        email: input.email,
        password_hash,
        role: input.role,
        status: input.status,
    })
}

/// Insert a prepared account, reporting a taken email as a conflict.
pub(crate) async fn insert_user(tx: &mut dyn StoreTx, create: &CreateUser) -> AppResult<User> {
    if tx.find_user_by_email(&create.email).await?.is_some() {
        return Err(CoreError::Conflict(EMAIL_TAKEN.into()).into());
    }
    tx.create_user(create).await.map_err(|e| match e {
        DbError::UniqueViolation(_) => CoreError::Conflict(EMAIL_TAKEN.into()).into(),
        other => AppError::from(other),
    })
}

async fn find_existing(tx: &mut dyn StoreTx, id: DbId) -> AppResult<User> {
    tx.find_user(id)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "User", id }.into())
}
