// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::{AppError, AuthFailure};
use crate::models::User;
use crate::services::tokens::TokenKind;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user resolved from the access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

/// Outcome of optional authentication: `None` for anonymous requests and
/// for requests whose token could not be verified.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// Pull the bearer token out of the `Authorization` header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthFailure> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthFailure::MissingHeader)?;
    let raw = value.to_str().map_err(|_| AuthFailure::MissingToken)?.trim();

    // Scheme is optional and case-insensitive. Trailing whitespace is lost in
    // transit, so a bare "Bearer" carries no token.
    let token = match raw.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if raw.eq_ignore_ascii_case("bearer") => "",
        _ => raw,
    };
    if token.is_empty() {
        return Err(AuthFailure::MissingToken);
    }
    Ok(token.to_string())
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let token = extract_bearer(headers).map_err(AppError::unauthorized)?;
    let claims = state.tokens.verify(&token, TokenKind::Access)?;

    let user = state
        .credentials
        .find_by_id(&claims.sub)
        .await?
        .ok_or(AppError::unauthorized(AuthFailure::UserNotFound))?;

    Ok(AuthUser { user })
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(&state, request.headers()).await?;
    tracing::debug!(user_id = %auth_user.id(), "Request authenticated");

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Middleware that attaches the user when a valid access token is present
/// and otherwise lets the request through anonymously.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_user = match authenticate(&state, request.headers()).await {
        Ok(user) => Some(user),
        Err(e) => {
            if request.headers().contains_key(header::AUTHORIZATION) {
                tracing::debug!(error = %e, "Ignoring unusable credentials on optional route");
            }
            None
        }
    };

    request.extensions_mut().insert(MaybeAuthUser(auth_user));
    next.run(request).await
}
