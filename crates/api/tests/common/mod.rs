#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Method, Request, Response};
use axum::Router;
use gatehouse_api::auth::jwt::JwtConfig;
use gatehouse_api::auth::password::hash_password;
use gatehouse_api::config::ServerConfig;
use gatehouse_api::router::build_app_router;
use gatehouse_api::state::AppState;
use gatehouse_core::roles::Role;
use gatehouse_db::models::user::{CreateUser, User};
use gatehouse_db::{MemoryStore, Store, UserStore};
use gatehouse_events::{SessionEventBus, SessionRecorder};
use http_body_util::BodyExt;
use jsonwebtoken::Algorithm;
use tower::ServiceExt;

/// Password used for every seeded account.
pub const PASSWORD: &str = "Pw1!";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:3000")],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        database_url: String::new(),
        database_max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the full application router over `store`, with a session recorder
/// consuming the event bus in the background.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app(store: MemoryStore) -> Router {
    let config = test_config();
    let store: Arc<dyn Store> = Arc::new(store);
    let event_bus = Arc::new(SessionEventBus::default());

    let recorder = SessionRecorder::new(
        Arc::clone(&store),
        config.jwt.access_ttl().num_seconds(),
    );
    tokio::spawn(recorder.run(event_bus.subscribe()));

    let state = AppState::new(config, store, event_bus);
    build_app_router(state)
}

/// Insert a user directly into the store, bypassing the role hierarchy.
pub async fn seed_user(store: &MemoryStore, email: &str, role: Role) -> User {
    let mut tx = store.begin().await.unwrap();
    let user = tx
        .create_user(&CreateUser {
            email: email.to_string(),
            password_hash: hash_password(PASSWORD).unwrap(),
            role,
            status: "active".to_string(),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    user
}

/// Log in through the API and return the access and refresh tokens.
pub async fn login(app: &Router, email: &str) -> (String, String) {
    let body = serde_json::json!({ "email": email, "password": PASSWORD });
    let response = post_json(app.clone(), "/api/v1/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let json = body_json(response).await;
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["refresh_token"].as_str().unwrap().to_string(),
    )
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, empty_request(Method::GET, uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::GET, uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn delete_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::DELETE, uri, None, body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::DELETE, uri, Some(token))).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
