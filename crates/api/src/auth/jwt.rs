//! JWT access/refresh token generation and validation.
//!
//! Both token kinds are signed JWTs distinguished by the `type` claim. Access
//! tokens additionally carry the user's role and a display `login`. Refresh
//! tokens are persisted server-side only as their SHA-256 hash so a database
//! leak does not expose usable credentials.

use chrono::{Duration, Utc};
use gatehouse_core::roles::Role;
use gatehouse_core::types::DbId;
use gatehouse_db::models::user::User;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Which half of a token pair a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's database id, rendered as a string.
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4). Keeps two tokens minted for the
    /// same user in the same second distinct.
    pub jti: String,
    /// Access tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Access tokens only: local part of the user's email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}

impl Claims {
    /// The subject parsed back into a user id, or `None` if it is not numeric.
    pub fn subject_id(&self) -> Option<DbId> {
        self.sub.parse().ok()
    }
}

/// Why a token failed verification. Only ever logged; callers collapse both
/// variants into a single authentication error.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret used to sign and verify tokens.
    pub secret: String,
    /// One of `HS256`, `HS384`, `HS512`.
    pub algorithm: Algorithm,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_expiry_mins)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_expiry_days)
    }
}

/// A freshly minted access + refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch seconds at which the refresh token stops being accepted.
    pub refresh_expires_at: i64,
}

/// Signs and verifies tokens with a fixed key and algorithm.
///
/// Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct TokenCodec {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Mint a token of the given kind for `user`.
    ///
    /// Returns the encoded token and its expiry in epoch seconds.
    pub fn issue(
        &self,
        user: &User,
        kind: TokenKind,
    ) -> Result<(String, i64), jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let (ttl, role, login) = match kind {
            TokenKind::Access => (
                self.config.access_ttl(),
                Some(user.role),
                Some(user.login().to_string()),
            ),
            TokenKind::Refresh => (self.config.refresh_ttl(), None, None),
        };
        let exp = now + ttl.num_seconds();

        let claims = Claims {
            sub: user.id.to_string(),
            kind,
            exp,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            role,
            login,
        };

        let token = encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.encoding_key,
        )?;
        Ok((token, exp))
    }

    /// Mint an access token and a refresh token for `user`.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, jsonwebtoken::errors::Error> {
        let (access_token, _) = self.issue(user, TokenKind::Access)?;
        let (refresh_token, refresh_expires_at) = self.issue(user, TokenKind::Refresh)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_expires_at,
        })
    }

    /// Check signature, algorithm and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

/// Compute the SHA-256 hex digest of a refresh token.
///
/// Use this to compare an incoming refresh token against the stored hash.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Helper to build a test config with a known secret.
    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    fn test_user() -> User {
        User {
            id: 42,
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Moderator,
            status: "active".to_string(),
            created_at: Utc::now(),
            last_active_at: None,
            total_active_time: 0,
        }
    }

    fn encode_raw(config: &JwtConfig, claims: &Claims) -> String {
        encode(
            &Header::new(config.algorithm),
            claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = TokenCodec::new(test_config());
        let (token, exp) = codec
            .issue(&test_user(), TokenKind::Access)
            .expect("token generation should succeed");

        let claims = codec.verify(&token).expect("token validation should succeed");
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.subject_id(), Some(42));
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.role, Some(Role::Moderator));
        assert_eq!(claims.login.as_deref(), Some("alice"));
        assert_eq!(claims.exp, exp);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_token_carries_no_role() {
        let codec = TokenCodec::new(test_config());
        let (token, exp) = codec.issue(&test_user(), TokenKind::Refresh).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert!(claims.role.is_none());
        assert!(claims.login.is_none());
        assert_eq!(exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_pair_tokens_differ_even_within_one_second() {
        let codec = TokenCodec::new(test_config());
        let a = codec.issue_pair(&test_user()).unwrap();
        let b = codec.issue_pair(&test_user()).unwrap();

        assert_ne!(a.access_token, a.refresh_token);
        assert_ne!(a.refresh_token, b.refresh_token);
        assert_ne!(a.access_token, b.access_token);
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let token = encode_raw(
            &config,
            &Claims {
                sub: "1".to_string(),
                kind: TokenKind::Access,
                exp: now - 5,
                iat: now - 600,
                jti: Uuid::new_v4().to_string(),
                role: Some(Role::User),
                login: None,
            },
        );

        let codec = TokenCodec::new(config);
        assert_matches!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_different_secrets_fail() {
        let codec_a = TokenCodec::new(JwtConfig {
            secret: "secret-alpha".to_string(),
            ..test_config()
        });
        let codec_b = TokenCodec::new(JwtConfig {
            secret: "secret-bravo".to_string(),
            ..test_config()
        });

        let (token, _) = codec_a.issue(&test_user(), TokenKind::Access).unwrap();
        assert_matches!(codec_b.verify(&token), Err(TokenError::Invalid(_)));
    }

    #[test]
    fn test_algorithm_mismatch_fails() {
        let hs256 = TokenCodec::new(test_config());
        let hs512 = TokenCodec::new(JwtConfig {
            algorithm: Algorithm::HS512,
            ..test_config()
        });

        let (token, _) = hs256.issue(&test_user(), TokenKind::Access).unwrap();
        assert_matches!(hs512.verify(&token), Err(TokenError::Invalid(_)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let codec = TokenCodec::new(test_config());
        assert_matches!(codec.verify("not.a.jwt"), Err(TokenError::Invalid(_)));
        assert_matches!(codec.verify(""), Err(TokenError::Invalid(_)));
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "abc".to_string(),
            kind: TokenKind::Refresh,
            exp: 0,
            iat: 0,
            jti: String::new(),
            role: None,
            login: None,
        };
        assert_eq!(claims.subject_id(), None);
    }

    #[test]
    fn test_refresh_token_hash_is_stable_hex() {
        let hash = hash_refresh_token("some-token");
        assert_eq!(hash, hash_refresh_token("some-token"));
        assert_ne!(hash, hash_refresh_token("other-token"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
