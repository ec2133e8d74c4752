// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens, each failure
//!    with its own error code
//! 2. Protected routes accept requests with valid access tokens
//! 3. The optional-auth route personalizes only for valid tokens
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{create_test_jwt, get_authed, register, send, unix_now};

#[tokio::test]
async fn test_protected_route_without_header() {
    let (app, _) = common::create_test_app();

    let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Authentication Required");
    assert_eq!(body["code"], "missing_header");
}

#[tokio::test]
async fn test_protected_route_with_bare_scheme() {
    let (app, _) = common::create_test_app();

    for value in ["Bearer", "bearer"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/users/profile")
                    .header(header::AUTHORIZATION, value)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "missing_token", "{value}");
        assert_eq!(body["error"], "Authentication Required");
    }
}

#[tokio::test]
async fn test_protected_route_with_empty_bearer() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/users/profile")
                .header(header::AUTHORIZATION, "Bearer ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "missing_token");
    assert_eq!(body["error"], "Authentication Required");
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _) = common::create_test_app();

    let (status, body) = get_authed(&app, "/api/auth/me", "invalid.token.here").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication Failed");
    assert_eq!(body["code"], "invalid_token");
}

#[tokio::test]
async fn test_protected_route_with_wrong_key() {
    let (app, _) = common::create_test_app();
    let session = register(&app, "key@x.com").await;
    let token = create_test_jwt(
        &session.user_id,
        "access",
        unix_now() + 3600,
        b"some_other_key_that_is_32_bytes!",
    );

    let (status, body) = get_authed(&app, "/api/auth/me", &token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_token");
}

#[tokio::test]
async fn test_protected_route_with_expired_token() {
    let (app, state) = common::create_test_app();
    let session = register(&app, "old@x.com").await;
    let token = create_test_jwt(
        &session.user_id,
        "access",
        unix_now() - 60,
        &state.config.jwt_secret,
    );

    let (status, body) = get_authed(&app, "/api/auth/me", &token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication Failed");
    assert_eq!(body["code"], "token_expired");
}

#[tokio::test]
async fn test_protected_route_rejects_refresh_token() {
    let (app, _) = common::create_test_app();
    let session = register(&app, "kind@x.com").await;

    let (status, body) = get_authed(&app, "/api/auth/me", &session.refresh_token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "wrong_token_type");
}

#[tokio::test]
async fn test_protected_route_for_vanished_user() {
    let (app, state) = common::create_test_app();
    let token = create_test_jwt(
        "user-does-not-exist",
        "access",
        unix_now() + 3600,
        &state.config.jwt_secret,
    );

    let (status, body) = get_authed(&app, "/api/auth/me", &token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "user_not_found");
    // No internals in auth failures.
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let (app, _) = common::create_test_app();
    let session = register(&app, "valid@x.com").await;

    let (status, body) = get_authed(&app, "/api/users/profile", &session.access_token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], session.user_id.as_str());
}

#[tokio::test]
async fn test_optional_auth_route() {
    let (app, _) = common::create_test_app();
    let session = register(&app, "hello@x.com").await;

    let (status, anonymous) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(anonymous.get("greeting").is_none());
    assert_eq!(anonymous["languages"], json!(["Swahili", "Lingala", "Amharic"]));

    // A bad token is ignored rather than rejected.
    let (status, bad) = get_authed(&app, "/", "garbage").await;
    assert_eq!(status, StatusCode::OK);
    assert!(bad.get("greeting").is_none());

    let (status, known) = get_authed(&app, "/", &session.access_token).await;
    assert_eq!(status, StatusCode::OK);
    let greeting = known["greeting"].as_str().unwrap();
    assert!(greeting.contains("Test User"));
    assert!(greeting.contains("Swahili"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/auth/login")
                .header(header::ORIGIN, "http://localhost:19006")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    // Should have CORS headers
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Health should be accessible without auth
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
