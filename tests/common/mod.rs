// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use monoko_api::config::Config;
use monoko_api::routes::create_router;
use monoko_api::AppState;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const PASSWORD: &str = "TestPassword123!";

/// Create a test app backed by an empty in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));
    (create_router(state.clone()), state)
}

/// Send a request and return the status plus parsed JSON body
/// (`Value::Null` for an empty body).
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[allow(dead_code)]
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, None, Some(body)).await
}

#[allow(dead_code)]
pub async fn get_authed(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(token), None).await
}

#[allow(dead_code)]
pub fn registration(email: &str) -> Value {
    json!({
        "name": "Test User",
        "email": email,
        "password": PASSWORD,
        "selectedLanguage": "sw"
    })
}

/// Tokens and id of a freshly registered user.
#[allow(dead_code)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    #[allow(dead_code)]
    pub fn from_body(body: &Value) -> Self {
        let data = &body["data"];
        Self {
            user_id: data["user"]["id"].as_str().unwrap().to_string(),
            access_token: data["accessToken"].as_str().unwrap().to_string(),
            refresh_token: data["refreshToken"].as_str().unwrap().to_string(),
        }
    }
}

/// Register `email` and return its session.
#[allow(dead_code)]
pub async fn register(app: &Router, email: &str) -> Session {
    let (status, body) = post_json(app, "/api/auth/register", registration(email)).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    Session::from_body(&body)
}

/// Sign arbitrary claims with `key`, for forging tokens the service
/// would never issue.
#[allow(dead_code)]
pub fn sign_claims<T: Serialize>(claims: &T, key: &[u8]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// A token with the service's claim layout.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, kind: &str, exp: usize, key: &[u8]) -> String {
    sign_claims(
        &json!({
            "sub": user_id,
            "type": kind,
            "iat": unix_now(),
            "exp": exp,
            "jti": "test-jti",
        }),
        key,
    )
}
