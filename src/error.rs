// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every failure leaving a handler or middleware is an [`AppError`].
//! [`AppError::parts`] is the one table mapping each kind to its HTTP
//! status, human title, machine-readable code and client message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;
use crate::services::tokens::TokenError;
use crate::validation::{FieldViolation, ValidationFailure};

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization` header
    MissingHeader,
    /// Header present but no token after the `Bearer ` prefix
    MissingToken,
    InvalidSignature,
    Expired,
    /// Token of the wrong kind (e.g. refresh token used as access token)
    KindMismatch,
    /// Token valid but the user no longer exists
    UserNotFound,
    /// Login failed; deliberately does not say which part was wrong
    InvalidCredentials,
    /// Refresh token not in the revocation set
    UnknownToken,
}

impl AuthFailure {
    pub fn code(self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "missing_header",
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::InvalidSignature => "invalid_token",
            AuthFailure::Expired => "token_expired",
            AuthFailure::KindMismatch => "wrong_token_type",
            AuthFailure::UserNotFound => "user_not_found",
            AuthFailure::InvalidCredentials => "invalid_credentials",
            AuthFailure::UnknownToken => "unknown_token",
        }
    }

    fn title(self) -> &'static str {
        match self {
            AuthFailure::MissingHeader | AuthFailure::MissingToken => "Authentication Required",
            _ => "Authentication Failed",
        }
    }

    fn message(self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "No authorization header provided",
            AuthFailure::MissingToken => "No token provided",
            AuthFailure::InvalidSignature => "Token is invalid",
            AuthFailure::Expired => "Token has expired",
            AuthFailure::KindMismatch => "Token type is not accepted here",
            AuthFailure::UserNotFound => "User not found",
            AuthFailure::InvalidCredentials => "Invalid email or password",
            AuthFailure::UnknownToken => "Invalid refresh token",
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed on {} field(s)", .0.violations.len())]
    Validation(ValidationFailure),

    #[error("Authentication failed: {0:?}")]
    Authentication(AuthFailure),

    #[error("User already exists with this email")]
    DuplicateEmail,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    /// Same error rendered under an endpoint-specific title.
    #[error("{1}")]
    Titled(&'static str, Box<AppError>),
}

/// How an error is presented to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorParts {
    pub status: StatusCode,
    pub title: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn unauthorized(failure: AuthFailure) -> Self {
        AppError::Authentication(failure)
    }

    /// Render under `title` instead of the kind's default title.
    pub fn titled(self, title: &'static str) -> Self {
        match self {
            AppError::Titled(_, inner) => AppError::Titled(title, inner),
            other => AppError::Titled(title, Box::new(other)),
        }
    }

    /// The innermost error, ignoring title overrides.
    pub fn kind(&self) -> &AppError {
        match self {
            AppError::Titled(_, inner) => inner.kind(),
            other => other,
        }
    }

    /// Status, title, code and message for this error.
    pub fn parts(&self) -> ErrorParts {
        let (status, title, code, message) = match self {
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "Validation Error",
                "validation_failed",
                "Please check your input data".to_string(),
            ),
            AppError::Authentication(failure) => (
                StatusCode::UNAUTHORIZED,
                failure.title(),
                failure.code(),
                failure.message().to_string(),
            ),
            AppError::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                "Conflict",
                "duplicate_email",
                "User already exists with this email".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", "not_found", msg.clone()),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "Bad Request",
                "bad_request",
                msg.clone(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "internal_error",
                "Internal server error".to_string(),
            ),
            AppError::Titled(title, inner) => {
                let parts = inner.parts();
                return ErrorParts { title, ..parts };
            }
        };

        ErrorParts {
            status,
            title,
            code,
            message,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => AppError::unauthorized(AuthFailure::InvalidSignature),
            TokenError::Expired => AppError::unauthorized(AuthFailure::Expired),
            TokenError::KindMismatch { .. } => AppError::unauthorized(AuthFailure::KindMismatch),
            TokenError::UnknownToken => AppError::unauthorized(AuthFailure::UnknownToken),
            TokenError::UserNotFound => AppError::unauthorized(AuthFailure::UserNotFound),
            TokenError::Signing(msg) | TokenError::Store(msg) => {
                AppError::Internal(anyhow::anyhow!(msg))
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::UserNotFound => AppError::NotFound("User not found".to_string()),
            StoreError::Backend(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// JSON error response body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

/// Internal failure text, attached to 500 responses as an extension so a
/// development-only layer can surface it. Never serialized by default.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let parts = self.parts();

        let internal_detail = match self.kind() {
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                Some(err.to_string())
            }
            AppError::Authentication(failure) => {
                tracing::debug!(code = failure.code(), "Request not authenticated");
                None
            }
            _ => None,
        };

        let details = match self.kind() {
            AppError::Validation(failure) => Some(failure.violations.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: parts.title.to_string(),
            code: parts.code.to_string(),
            message: parts.message,
            details,
        };

        let mut response = (parts.status, Json(body)).into_response();
        if let Some(detail) = internal_detail {
            response.extensions_mut().insert(InternalDetail(detail));
        }
        response
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
