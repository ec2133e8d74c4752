// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes under `/api/auth`.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{User, UserProfile, UserSummary};
use crate::services::tokens::TokenPair;
use crate::validation::schemas::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LogoutRequest, RefreshRequest,
    RegisterRequest, ResetPasswordRequest, VerifyEmailRequest,
};
use crate::validation::{validate_value, Valid};
use crate::AppState;

/// Routes that do not require a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/verify-email", post(verify_email))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
}

/// Routes that require a valid access token.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/change-password", post(change_password))
}

/// User plus a fresh token pair, returned by register, login and refresh.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub struct SessionResponse {
    pub user: UserSummary,
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub tokens: TokenPair,
}

impl SessionResponse {
    fn new(user: &User, tokens: TokenPair) -> Self {
        Self {
            user: user.summary(),
            tokens,
        }
    }
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Valid(req): Valid<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>)> {
    let (user, tokens) = state
        .credentials
        .register(&req.email, &req.name, &req.password, req.selected_language)
        .await
        .map_err(|e| e.titled("Registration Failed"))?;

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(SessionResponse::new(&user, tokens))
                .with_message("User registered successfully"),
        ),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Valid(req): Valid<LoginRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>> {
    let (user, tokens) = state
        .credentials
        .login(&req.email, &req.password)
        .await
        .map_err(|e| e.titled("Login Failed"))?;

    Ok(Json(
        ApiResponse::data(SessionResponse::new(&user, tokens)).with_message("Login successful"),
    ))
}

/// Rotate a refresh token. A missing token is a 400, anything else that
/// goes wrong is a 401.
async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Valid<RefreshRequest>, AppError>,
) -> Result<Json<ApiResponse<SessionResponse>>> {
    let Valid(req) = payload.map_err(|_| {
        AppError::BadRequest("Refresh token is required".to_string()).titled("Missing Token")
    })?;

    let (user, tokens) = state
        .tokens
        .refresh(&req.refresh_token)
        .await
        .map_err(|e| AppError::from(e).titled("Token Refresh Failed"))?;

    Ok(Json(
        ApiResponse::data(SessionResponse::new(&user, tokens))
            .with_message("Token refreshed successfully"),
    ))
}

/// Revoke the refresh token if one is supplied. Always succeeds.
async fn logout(State(state): State<Arc<AppState>>, body: Bytes) -> Json<ApiResponse<()>> {
    let token = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| validate_value::<LogoutRequest>(&value).ok())
        .and_then(|req| req.refresh_token);

    if let Some(token) = token {
        state.tokens.revoke(&token);
    }

    Json(ApiResponse::message("Logged out successfully"))
}

async fn me(Extension(auth): Extension<AuthUser>) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::data(MeResponse {
        user: auth.user.profile(),
    }))
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Valid(req): Valid<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .credentials
        .change_password(auth.id(), &req.current_password, &req.new_password)
        .await
        .map_err(|e| e.titled("Password Change Failed"))?;

    Ok(Json(ApiResponse::message("Password changed successfully")))
}

// Email delivery is not wired up yet. The three handlers below check their
// input and acknowledge without sending or changing anything.

fn missing(title: &'static str, message: &str) -> AppError {
    AppError::BadRequest(message.to_string()).titled(title)
}

async fn verify_email(
    payload: std::result::Result<Valid<VerifyEmailRequest>, AppError>,
) -> Result<Json<ApiResponse<()>>> {
    payload.map_err(|_| missing("Missing Token", "Verification token is required"))?;
    Ok(Json(ApiResponse::message("Email verified successfully")))
}

async fn forgot_password(
    payload: std::result::Result<Valid<ForgotPasswordRequest>, AppError>,
) -> Result<Json<ApiResponse<()>>> {
    payload.map_err(|_| missing("Missing Email", "Email address is required"))?;
    tracing::info!("Password reset requested");
    Ok(Json(ApiResponse::message("Password reset instructions sent to your email")))
}

async fn reset_password(
    payload: std::result::Result<Valid<ResetPasswordRequest>, AppError>,
) -> Result<Json<ApiResponse<()>>> {
    payload.map_err(|_| missing("Missing Data", "Reset token and new password are required"))?;
    Ok(Json(ApiResponse::message("Password reset successfully")))
}
