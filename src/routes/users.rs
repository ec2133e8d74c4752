// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Learner profile routes under `/api/users`.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Language, Preferences, UserProfile, UserUpdate};
use crate::validation::schemas::{
    ChangeLanguageRequest, DeleteAccountRequest, UpdatePreferencesRequest, UpdateProfileRequest,
};
use crate::validation::Valid;
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::ApiResponse;

/// Profile routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/profile", get(get_profile).put(update_profile))
        .route("/api/users/preferences", post(update_preferences))
        .route("/api/users/language", post(change_language))
        .route("/api/users/account", delete(delete_account))
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_profile(Extension(auth): Extension<AuthUser>) -> Json<ApiResponse<UserProfile>> {
    Json(ApiResponse::data(auth.user.profile()))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Valid(req): Valid<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let update = req.into_update();
    if update.is_empty() {
        return Ok(Json(
            ApiResponse::data(auth.user.profile()).with_message("Nothing to update"),
        ));
    }

    let user = state
        .credentials
        .update(auth.id(), update)
        .await
        .map_err(|e| e.titled("Profile Update Failed"))?;

    Ok(Json(
        ApiResponse::data(user.profile()).with_message("Profile updated successfully"),
    ))
}

// ─── Preferences ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct PreferencesResponse {
    pub preferences: Preferences,
}

async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Valid(req): Valid<UpdatePreferencesRequest>,
) -> Result<Json<ApiResponse<PreferencesResponse>>> {
    let update = UserUpdate {
        preferences: Some(req.preferences.into_patch()),
        ..UserUpdate::default()
    };

    let user = state
        .credentials
        .update(auth.id(), update)
        .await
        .map_err(|e| e.titled("Preferences Update Failed"))?;

    Ok(Json(
        ApiResponse::data(PreferencesResponse {
            preferences: user.preferences,
        })
        .with_message("Preferences updated successfully"),
    ))
}

// ─── Language ────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageResponse {
    pub selected_language: Language,
    pub language_name: &'static str,
}

async fn change_language(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Valid(req): Valid<ChangeLanguageRequest>,
) -> Result<Json<ApiResponse<LanguageResponse>>> {
    let update = UserUpdate {
        selected_language: Some(req.language),
        ..UserUpdate::default()
    };

    let user = state
        .credentials
        .update(auth.id(), update)
        .await
        .map_err(|e| e.titled("Language Change Failed"))?;

    let language = user.selected_language;
    tracing::info!(user_id = %user.id, language = %language, "Language changed");

    Ok(Json(
        ApiResponse::data(LanguageResponse {
            selected_language: language,
            language_name: language.display_name(),
        })
        .with_message(format!(
            "Language changed to {} successfully",
            language.display_name()
        )),
    ))
}

// ─── Account Deletion ────────────────────────────────────────

/// Acknowledge an account deletion request. Nothing is removed yet.
async fn delete_account(
    Extension(auth): Extension<AuthUser>,
    payload: std::result::Result<Valid<DeleteAccountRequest>, AppError>,
) -> Result<Json<ApiResponse<()>>> {
    payload.map_err(|e| e.titled("Confirmation Required"))?;

    tracing::info!(user_id = %auth.id(), "User-initiated account deletion");

    Ok(Json(ApiResponse::message(
        "Account deletion request received. Your account will be deleted within 24 hours.",
    )))
}
