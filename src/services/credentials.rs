// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration, login and profile persistence.

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use crate::db::{StoreError, UserRepository};
use crate::error::{AppError, AuthFailure, Result};
use crate::models::{Language, Preferences, Progress, User, UserUpdate, WeeklyStats};
use crate::services::password::PasswordHasher;
use crate::services::tokens::{TokenPair, TokenService};

pub const DEMO_EMAIL: &str = "demo@monoko.app";
pub const DEMO_PASSWORD: &str = "Monoko123!";

/// Credential store: user records, password checks and session issuance.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Create an account and sign the new user in.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        language: Language,
    ) -> Result<(User, TokenPair)> {
        // Cheap early exit; the insert below is what actually enforces uniqueness.
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .users
            .insert(User::new(
                email.trim().to_string(),
                name.trim().to_string(),
                password_hash,
                language,
            ))
            .await?;

        let pair = self.tokens.issue_pair(&user.id)?;
        tracing::info!(user_id = %user.id, language = %user.selected_language, "User registered");
        Ok((user, pair))
    }

    /// Check credentials and issue a new token pair.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair)> {
        let Some(user) = self.users.find_by_email(email).await? else {
            self.hasher.verify_dummy(password).await?;
            tracing::debug!("Login attempt for unknown email");
            return Err(AppError::unauthorized(AuthFailure::InvalidCredentials));
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::unauthorized(AuthFailure::InvalidCredentials));
        }

        let pair = self.tokens.issue_pair(&user.id)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, pair))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.find_by_id(id).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_by_email(email).await?)
    }

    /// Merge `update` into the stored user.
    pub async fn update(&self, id: &str, update: UserUpdate) -> Result<User> {
        let user = self
            .users
            .update(id, Box::new(move |user: &mut User| update.apply(user)))
            .await?;
        tracing::debug!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Replace the password after confirming the current one.
    pub async fn change_password(&self, id: &str, current: &str, new: &str) -> Result<()> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(StoreError::UserNotFound)?;

        if !self.hasher.verify(current, &user.password_hash).await? {
            return Err(AppError::unauthorized(AuthFailure::InvalidCredentials));
        }

        let password_hash = self.hasher.hash(new).await?;
        self.users
            .update(
                id,
                Box::new(move |user: &mut User| user.password_hash = password_hash),
            )
            .await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Insert the demo learner account if it is not already present.
    pub async fn seed_demo_users(&self) -> Result<()> {
        if self.users.find_by_email(DEMO_EMAIL).await?.is_some() {
            return Ok(());
        }

        let mut user = User::new(
            DEMO_EMAIL.to_string(),
            "Demo User".to_string(),
            self.hasher.hash(DEMO_PASSWORD).await?,
            Language::Swahili,
        );
        user.streak = 5;
        user.total_xp = 1250;
        user.level = 3;
        if let Some(joined) = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single() {
            user.joined_date = joined;
        }
        user.preferences = Preferences {
            daily_goal: 20,
            offline_mode: true,
            ..Preferences::default()
        };
        user.progress = Progress {
            completed_lessons: vec!["sw-basics-1".to_string()],
            current_lesson: Some("sw-basics-2".to_string()),
            achievements: vec!["first-lesson".to_string(), "week-warrior".to_string()],
            weekly_stats: WeeklyStats {
                lessons_completed: 3,
                time_spent: 180,
                xp_earned: 150,
            },
        };

        match self.users.insert(user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = DEMO_EMAIL, "Demo user seeded");
                Ok(())
            }
            // Lost a race with another seeder; the account exists either way.
            Err(StoreError::DuplicateEmail) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
