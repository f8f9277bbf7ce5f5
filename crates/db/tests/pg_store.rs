//! Postgres-backed store tests. These need a live database:
//! `DATABASE_URL=postgres://... cargo test -p gatehouse-db -- --ignored`

use assert_matches::assert_matches;
use gatehouse_core::roles::Role;
use gatehouse_db::models::login_session::{CreateLoginSession, TouchLoginSession};
use gatehouse_db::models::refresh_token::CreateRefreshToken;
use gatehouse_db::models::user::{CreateUser, UpdateUser, UserFilter};
use gatehouse_db::{DbError, PgStore, SessionStore, Store, TokenStore, UserStore};
use sqlx::PgPool;

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        email: email.to_string(),
        password_hash: "hash".to_string(),
        role: Role::User,
        status: "active".to_string(),
    }
}

fn all_users() -> UserFilter {
    UserFilter {
        search: None,
        role: None,
        limit: 100,
        offset: 0,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_health_check(pool: PgPool) {
    gatehouse_db::health_check(&pool).await.unwrap();
    PgStore::new(pool).health_check().await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    tx.create_user(&new_user("a@example.com")).await.unwrap();
    assert_matches!(
        tx.create_user(&new_user("a@example.com")).await,
        Err(DbError::UniqueViolation(c)) if c == "uq_users_email"
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_uncommitted_transaction_rolls_back(pool: PgPool) {
    let store = PgStore::new(pool);
    {
        let mut tx = store.begin().await.unwrap();
        tx.create_user(&new_user("gone@example.com")).await.unwrap();
    }
    let mut tx = store.begin().await.unwrap();
    assert!(tx
        .find_user_by_email("gone@example.com")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_rotation_is_in_place_and_conditional(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    let user = tx.create_user(&new_user("a@example.com")).await.unwrap();
    let token = tx
        .insert_refresh_token(&CreateRefreshToken {
            user_id: user.id,
            token_hash: "h1".into(),
            expires_at: 100,
        })
        .await
        .unwrap();

    let rotated = tx
        .rotate_refresh_token(token.id, "h1", "h2", 200)
        .await
        .unwrap()
        .expect("first rotation succeeds");
    assert_eq!(rotated.id, token.id);

    assert!(tx
        .rotate_refresh_token(token.id, "h1", "h3", 300)
        .await
        .unwrap()
        .is_none());
    assert!(tx.find_refresh_token("h1").await.unwrap().is_none());
    tx.commit().await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_user_delete_cascades(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    let user = tx.create_user(&new_user("a@example.com")).await.unwrap();
    let token = tx
        .insert_refresh_token(&CreateRefreshToken {
            user_id: user.id,
            token_hash: "h1".into(),
            expires_at: 100,
        })
        .await
        .unwrap();
    tx.create_login_session(&CreateLoginSession {
        user_id: user.id,
        refresh_token_id: token.id,
        ip_address: Some("10.0.0.1".into()),
        ..Default::default()
    })
    .await
    .unwrap();

    let touched = tx
        .touch_login_session(
            token.id,
            &TouchLoginSession {
                ip_address: None,
                user_agent: Some("curl/8.5.0".into()),
                device_type: Some("unknown".into()),
                browser: None,
                os: None,
                at: chrono::Utc::now(),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(touched.ip_address.as_deref(), Some("10.0.0.1"));
    assert_eq!(touched.user_agent.as_deref(), Some("curl/8.5.0"));
    assert_eq!(touched.device_type.as_deref(), Some("unknown"));

    assert!(tx.delete_user(user.id).await.unwrap());
    assert!(tx.find_refresh_token("h1").await.unwrap().is_none());
    assert!(tx.find_login_session(token.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_search_is_case_insensitive_and_literal(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    tx.create_user(&new_user("Percent%Sign@example.com"))
        .await
        .unwrap();
    tx.create_user(&new_user("plain@example.com")).await.unwrap();

    let found = tx
        .list_users(&UserFilter {
            search: Some("percent%".into()),
            ..all_users()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let none = tx
        .list_users(&UserFilter {
            search: Some("%".into()),
            ..all_users()
        })
        .await
        .unwrap();
    assert_eq!(none.len(), 1, "% must match literally");

    let admin = tx.create_user(&new_user("root@example.com")).await.unwrap();
    tx.update_user(
        admin.id,
        &UpdateUser {
            role: Some(Role::Admin),
            status: None,
        },
    )
    .await
    .unwrap();
    let admins = tx
        .list_users(&UserFilter {
            role: Some(Role::Admin),
            ..all_users()
        })
        .await
        .unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].role, Role::Admin);
}
