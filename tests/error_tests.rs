// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use monoko_api::error::{AppError, AuthFailure, InternalDetail};
use monoko_api::validation::ValidationFailure;

#[test]
fn test_error_mapping_table() {
    let cases = [
        (
            AppError::Validation(ValidationFailure::single("email", "bad", None)),
            StatusCode::BAD_REQUEST,
            "Validation Error",
        ),
        (
            AppError::unauthorized(AuthFailure::MissingHeader),
            StatusCode::UNAUTHORIZED,
            "Authentication Required",
        ),
        (
            AppError::unauthorized(AuthFailure::Expired),
            StatusCode::UNAUTHORIZED,
            "Authentication Failed",
        ),
        (AppError::DuplicateEmail, StatusCode::BAD_REQUEST, "Conflict"),
        (
            AppError::NotFound("gone".to_string()),
            StatusCode::NOT_FOUND,
            "Not Found",
        ),
        (
            AppError::Internal(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
        ),
    ];

    for (err, status, title) in cases {
        let parts = err.parts();
        assert_eq!(parts.status, status, "{err}");
        assert_eq!(parts.title, title, "{err}");
    }
}

#[test]
fn test_internal_error_response_carries_detail_extension() {
    let response = AppError::Internal(anyhow::anyhow!("db password is hunter2")).into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = response.extensions().get::<InternalDetail>().unwrap();
    assert!(detail.0.contains("hunter2"));
}

#[test]
fn test_client_errors_carry_no_detail_extension() {
    let response = AppError::BadRequest("nope".to_string()).into_response();
    assert!(response.extensions().get::<InternalDetail>().is_none());
}
