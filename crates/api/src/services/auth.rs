//! Credential lifecycle: registration, login, refresh rotation and logout.
//!
//! A refresh credential moves `ISSUED -> ROTATED | REVOKED | EXPIRED`.
//! Rotation rewrites the same row with a conditional update keyed on the old
//! value, so a replayed or concurrently reused token finds nothing and fails.
//! Session bookkeeping is published on the event bus only after commit.

use std::sync::Arc;

use chrono::Utc;
use gatehouse_core::error::CoreError;
use gatehouse_core::types::DbId;
use gatehouse_db::models::refresh_token::{CreateRefreshToken, RefreshToken};
use gatehouse_db::models::user::User;
use gatehouse_db::{Store, StoreTx, TokenStore, UserStore};
use gatehouse_events::{ClientInfo, SessionEvent, SessionEventBus};

use super::directory::{self, NewUser};
use crate::auth::jwt::{hash_refresh_token, TokenCodec, TokenKind};
use crate::error::{AppError, AppResult};
use crate::response::TokenResponse;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
const REFRESH_TOKEN_NOT_FOUND: &str = "Refresh token not found";
const REFRESH_TOKEN_EXPIRED: &str = "Refresh token expired";

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.to_string()))
}

/// Tokens handed to the client plus the ids the session log is keyed by.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub tokens: TokenResponse,
    pub user_id: DbId,
    /// Id of the refresh credential; stable across rotations.
    pub refresh_token_id: DbId,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    codec: Arc<TokenCodec>,
    events: Arc<SessionEventBus>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        codec: Arc<TokenCodec>,
        events: Arc<SessionEventBus>,
    ) -> Self {
        Self {
            store,
            codec,
            events,
        }
    }

    /// Self-registration. Only the `user` role may be requested.
    pub async fn register(&self, input: NewUser, client: ClientInfo) -> AppResult<IssuedTokens> {
        let create = directory::prepare_user(None, input).await?;
        let mut tx = self.store.begin().await?;
        let user = directory::insert_user(tx.as_mut(), &create).await?;
        let (tokens, credential) = self.issue_pair(tx.as_mut(), &user).await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(self.opened(user.id, credential.id, tokens, client))
    }

    /// Password login. An unknown email and a wrong password are
    /// indistinguishable to the caller.
    ///
    /// The lookup and the token write use separate transactions so that no
    /// connection is held during password verification.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientInfo,
    ) -> AppResult<IssuedTokens> {
        let user = {
            let mut tx = self.store.begin().await?;
            tx.find_user_by_email(email).await?
        };
        let Some(user) = user else {
            tracing::debug!("Login rejected: unknown email");
            return Err(unauthorized(INVALID_CREDENTIALS));
        };

        let valid =
            super::verify_password(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(unauthorized(INVALID_CREDENTIALS));
        }

        let mut tx = self.store.begin().await?;
        let (tokens, credential) = self.issue_pair(tx.as_mut(), &user).await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(self.opened(user.id, credential.id, tokens, client))
    }

    /// Mint a token pair for `user` and persist the refresh half.
    pub async fn issue_pair(
        &self,
        tx: &mut dyn StoreTx,
        user: &User,
    ) -> AppResult<(TokenResponse, RefreshToken)> {
        let pair = self
            .codec
            .issue_pair(user)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

        let credential = tx
            .insert_refresh_token(&CreateRefreshToken {
                user_id: user.id,
                token_hash: hash_refresh_token(&pair.refresh_token),
                expires_at: pair.refresh_expires_at,
            })
            .await?;
        Ok((pair.into(), credential))
    }

    /// Exchange a refresh token for a new pair, invalidating the old one.
    pub async fn refresh(&self, token: &str, client: ClientInfo) -> AppResult<IssuedTokens> {
        let claims = self.codec.verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "Refresh rejected by token codec");
            unauthorized(INVALID_REFRESH_TOKEN)
        })?;
        if claims.kind != TokenKind::Refresh {
            tracing::debug!("Refresh rejected: not a refresh token");
            return Err(unauthorized(INVALID_REFRESH_TOKEN));
        }
        let subject_id = claims
            .subject_id()
            .ok_or_else(|| unauthorized(INVALID_REFRESH_TOKEN))?;

        let current_hash = hash_refresh_token(token);
        let mut tx = self.store.begin().await?;
        let Some(credential) = tx.find_refresh_token(&current_hash).await? else {
            tracing::warn!(user_id = subject_id, "Refresh token not found, possible reuse");
            return Err(unauthorized(REFRESH_TOKEN_NOT_FOUND));
        };
        if credential.user_id != subject_id {
            return Err(unauthorized(INVALID_REFRESH_TOKEN));
        }

        if credential.is_expired_at(Utc::now().timestamp()) {
            tx.delete_refresh_token(credential.id).await?;
            tx.commit().await?;
            tracing::debug!(refresh_token_id = credential.id, "Expired refresh token removed");
            return Err(unauthorized(REFRESH_TOKEN_EXPIRED));
        }

        let user = tx
            .find_user(credential.user_id)
            .await?
            .ok_or_else(|| unauthorized(INVALID_REFRESH_TOKEN))?;
        let pair = self
            .codec
            .issue_pair(&user)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

        let rotated = tx
            .rotate_refresh_token(
                credential.id,
                &current_hash,
                &hash_refresh_token(&pair.refresh_token),
                pair.refresh_expires_at,
            )
            .await?;
        if rotated.is_none() {
            tracing::warn!(
                refresh_token_id = credential.id,
                "Refresh token rotated concurrently"
            );
            return Err(unauthorized(REFRESH_TOKEN_NOT_FOUND));
        }
        tx.commit().await?;

        tracing::debug!(
            user_id = user.id,
            refresh_token_id = credential.id,
            "Refresh token rotated"
        );
        self.events
            .publish(SessionEvent::refreshed(user.id, credential.id, client));
        Ok(IssuedTokens {
            tokens: pair.into(),
            user_id: user.id,
            refresh_token_id: credential.id,
        })
    }

    /// Revoke a single refresh token. Returns `false` if it was unknown.
    pub async fn logout(&self, token: &str) -> AppResult<bool> {
        let mut tx = self.store.begin().await?;
        let Some(credential) = tx.find_refresh_token(&hash_refresh_token(token)).await? else {
            return Ok(false);
        };
        tx.delete_refresh_token(credential.id).await?;
        tx.commit().await?;

        tracing::info!(user_id = credential.user_id, "User logged out");
        Ok(true)
    }

    /// Revoke every refresh token of `user_id`. Returns `true` if any existed.
    pub async fn logout_all(&self, user_id: DbId) -> AppResult<bool> {
        let mut tx = self.store.begin().await?;
        let revoked = tx.delete_user_refresh_tokens(user_id).await?;
        tx.commit().await?;

        tracing::info!(user_id, revoked, "User logged out everywhere");
        Ok(revoked > 0)
    }

    fn opened(
        &self,
        user_id: DbId,
        refresh_token_id: DbId,
        tokens: TokenResponse,
        client: ClientInfo,
    ) -> IssuedTokens {
        self.events
            .publish(SessionEvent::opened(user_id, refresh_token_id, client));
        IssuedTokens {
            tokens,
            user_id,
            refresh_token_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use gatehouse_core::roles::Role;
    use gatehouse_db::MemoryStore;
    use jsonwebtoken::Algorithm;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::auth::jwt::JwtConfig;

    const PASSWORD: &str = "Pw1!";

    struct Harness {
        store: MemoryStore,
        auth: AuthService,
        bus: Arc<SessionEventBus>,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let shared: Arc<dyn Store> = Arc::new(store.clone());
        let codec = Arc::new(TokenCodec::new(JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }));
        let bus = Arc::new(SessionEventBus::default());
        let auth = AuthService::new(shared, codec, Arc::clone(&bus));
        Harness { store, auth, bus }
    }

    fn signup(email: &str, role: Role) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role,
            status: "active".to_string(),
        }
    }

    fn assert_unauthorized(result: AppResult<IssuedTokens>, expected: &str) {
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::Unauthorized(msg))) if msg == expected
        );
    }

    #[tokio::test]
    async fn register_issues_distinct_tokens_and_publishes_opened() {
        let h = harness();
        let mut rx = h.bus.subscribe();

        let issued = h
            .auth
            .register(signup("u1@example.com", Role::User), ClientInfo::default())
            .await
            .unwrap();
        assert_ne!(issued.tokens.access_token, issued.tokens.refresh_token);
        assert_eq!(issued.tokens.token_type, "bearer");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "session.opened");
        assert_eq!(event.user_id(), issued.user_id);
        assert_eq!(event.refresh_token_id(), issued.refresh_token_id);
    }

    #[tokio::test]
    async fn anonymous_registration_cannot_escalate() {
        let h = harness();
        assert_matches!(
            h.auth
                .register(signup("boss@example.com", Role::Admin), ClientInfo::default())
                .await,
            Err(AppError::Core(CoreError::Validation(_)))
        );

        let mut tx = h.store.begin().await.unwrap();
        assert!(tx
            .find_user_by_email("boss@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let h = harness();
        h.auth
            .register(signup("u1@example.com", Role::User), ClientInfo::default())
            .await
            .unwrap();

        assert_unauthorized(
            h.auth
                .login("u1@example.com", "wrong", ClientInfo::default())
                .await,
            INVALID_CREDENTIALS,
        );
        assert_unauthorized(
            h.auth
                .login("ghost@example.com", PASSWORD, ClientInfo::default())
                .await,
            INVALID_CREDENTIALS,
        );
        assert!(h
            .auth
            .login("u1@example.com", PASSWORD, ClientInfo::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn refresh_rotates_in_place_and_rejects_reuse() {
        let h = harness();
        let issued = h
            .auth
            .register(signup("u1@example.com", Role::User), ClientInfo::default())
            .await
            .unwrap();
        let old = issued.tokens.refresh_token.clone();

        let rotated = h.auth.refresh(&old, ClientInfo::default()).await.unwrap();
        assert_eq!(rotated.refresh_token_id, issued.refresh_token_id);
        assert_ne!(rotated.tokens.refresh_token, old);

        assert_unauthorized(
            h.auth.refresh(&old, ClientInfo::default()).await,
            REFRESH_TOKEN_NOT_FOUND,
        );
        assert!(h
            .auth
            .refresh(&rotated.tokens.refresh_token, ClientInfo::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let h = harness();
        let issued = h
            .auth
            .register(signup("u1@example.com", Role::User), ClientInfo::default())
            .await
            .unwrap();

        assert_unauthorized(
            h.auth
                .refresh(&issued.tokens.access_token, ClientInfo::default())
                .await,
            INVALID_REFRESH_TOKEN,
        );
        assert_unauthorized(
            h.auth.refresh("garbage", ClientInfo::default()).await,
            INVALID_REFRESH_TOKEN,
        );
    }

    #[tokio::test]
    async fn stored_expiry_wins_and_removes_credential() {
        let h = harness();
        let issued = h
            .auth
            .register(signup("u1@example.com", Role::User), ClientInfo::default())
            .await
            .unwrap();
        let token = issued.tokens.refresh_token;
        let hash = hash_refresh_token(&token);

        {
            let mut tx = h.store.begin().await.unwrap();
            tx.rotate_refresh_token(issued.refresh_token_id, &hash, &hash, 0)
                .await
                .unwrap()
                .unwrap();
            tx.commit().await.unwrap();
        }

        assert_unauthorized(
            h.auth.refresh(&token, ClientInfo::default()).await,
            REFRESH_TOKEN_EXPIRED,
        );
        let mut tx = h.store.begin().await.unwrap();
        assert!(tx.find_refresh_token(&hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_and_logout_all_revoke() {
        let h = harness();
        let first = h
            .auth
            .register(signup("u1@example.com", Role::User), ClientInfo::default())
            .await
            .unwrap();
        let second = h
            .auth
            .login("u1@example.com", PASSWORD, ClientInfo::default())
            .await
            .unwrap();

        assert!(h.auth.logout(&first.tokens.refresh_token).await.unwrap());
        assert!(!h.auth.logout(&first.tokens.refresh_token).await.unwrap());
        assert_unauthorized(
            h.auth
                .refresh(&first.tokens.refresh_token, ClientInfo::default())
                .await,
            REFRESH_TOKEN_NOT_FOUND,
        );

        assert!(h.auth.logout_all(second.user_id).await.unwrap());
        assert!(!h.auth.logout_all(second.user_id).await.unwrap());
        assert_unauthorized(
            h.auth
                .refresh(&second.tokens.refresh_token, ClientInfo::default())
                .await,
            REFRESH_TOKEN_NOT_FOUND,
        );
    }

    /// Let `task` run to its first suspension, then report whether a new
    /// transaction can start without waiting.
    async fn store_is_free_while_running<T>(store: &MemoryStore, task: &JoinHandle<T>) -> bool {
        tokio::task::yield_now().await;
        assert!(!task.is_finished(), "task should be waiting on the password hash");
        tokio::time::timeout(std::time::Duration::ZERO, store.begin())
            .await
            .is_ok()
    }

    #[tokio::test]
    async fn login_verifies_password_outside_a_transaction() {
        let h = harness();
        h.auth
            .register(signup("u1@example.com", Role::User), ClientInfo::default())
            .await
            .unwrap();

        let auth = h.auth.clone();
        let login = tokio::spawn(async move {
            auth.login("u1@example.com", PASSWORD, ClientInfo::default())
                .await
        });
        assert!(store_is_free_while_running(&h.store, &login).await);
        assert!(login.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn register_hashes_before_opening_a_transaction() {
        let h = harness();
        let auth = h.auth.clone();
        let register = tokio::spawn(async move {
            auth.register(signup("u1@example.com", Role::User), ClientInfo::default())
                .await
        });
        assert!(store_is_free_while_running(&h.store, &register).await);
        assert!(register.await.unwrap().is_ok());
    }
}
