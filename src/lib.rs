// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Monoko API: accounts and sessions for the Monoko language-learning app
//!
//! This crate provides registration, login, token refresh rotation, request
//! validation and the learner profile endpoints of the Monoko backend.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::{InMemoryUserStore, UserRepository};
use services::{CredentialService, PasswordHasher, TokenService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserRepository>,
    pub tokens: TokenService,
    pub credentials: CredentialService,
}

impl AppState {
    /// State backed by a fresh in-memory user store.
    pub fn new(config: Config) -> Self {
        Self::with_repository(config, Arc::new(InMemoryUserStore::new()))
    }

    pub fn with_repository(config: Config, users: Arc<dyn UserRepository>) -> Self {
        let tokens = TokenService::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
            users.clone(),
        );
        let hasher = PasswordHasher::new(config.bcrypt_cost, config.hash_concurrency);
        let credentials = CredentialService::new(users.clone(), hasher, tokens.clone());

        Self {
            config,
            users,
            tokens,
            credentials,
        }
    }
}
