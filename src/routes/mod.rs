// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod users;

use crate::error::AppError;
use crate::middleware::auth::{optional_auth, require_auth, MaybeAuthUser};
use crate::models::Language;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::http::{header, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Success envelope shared by every endpoint: `{success, message?, data?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: format_utc_rfc3339(chrono::Utc::now()),
        build_id,
    })
}

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: &'static str,
    pub languages: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

/// Service banner; greets the learner by name when a valid token is sent.
async fn welcome(Extension(MaybeAuthUser(auth)): Extension<MaybeAuthUser>) -> Json<WelcomeResponse> {
    let greeting = auth.map(|auth| {
        format!(
            "Karibu tena, {}! Keep going with {}.",
            auth.user.name,
            auth.user.selected_language.display_name()
        )
    });

    Json(WelcomeResponse {
        message: "Welcome to Monoko API - Speak the Heart of Africa!".to_string(),
        version: env!("CARGO_PKG_VERSION"),
        languages: [Language::Swahili, Language::Lingala, Language::Amharic]
            .into_iter()
            .map(Language::display_name)
            .collect(),
        greeting,
    })
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path())).titled("Route Not Found")
}

/// Render a caught panic as an ordinary 500.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(anyhow::anyhow!("Handler panicked: {}", detail)).into_response()
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Native clients and local tooling call the API directly; auth is by
    // bearer token, not cookies.
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    let optional_routes = Router::new()
        .route("/", get(welcome))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    // Protected routes (auth required)
    let protected_routes = auth::protected_routes()
        .merge(users::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut app = Router::new()
        .merge(public_routes)
        .merge(optional_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(CatchPanicLayer::custom(handle_panic));

    if !state.config.is_production() {
        app = app.layer(middleware::from_fn(
            crate::middleware::errors::expose_internal_errors,
        ));
    }

    app.layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
