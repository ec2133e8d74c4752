// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! bcrypt password hashing on the blocking thread pool.

use std::sync::{Arc, OnceLock};
use tokio::sync::Semaphore;

use crate::error::AppError;

/// Hashes and verifies passwords without stalling the async executor.
///
/// bcrypt is deliberately slow, so every call runs in `spawn_blocking`
/// behind a semaphore that caps how many hashes run at once.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    permits: Arc<Semaphore>,
    /// Hash compared against when the account does not exist, so that an
    /// unknown email costs the same as a wrong password.
    dummy_hash: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32, max_concurrent: usize) -> Self {
        Self {
            cost,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Salted one-way hash of `password`.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;
        self.run(move || bcrypt::hash(password, cost)).await
    }

    /// Check `password` against a stored bcrypt hash.
    ///
    /// A malformed stored hash counts as a mismatch.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = self
            .run(move || match bcrypt::verify(password, &hash) {
                Ok(matches) => Ok(matches),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored password hash could not be parsed");
                    Ok(false)
                }
            })
            .await?;
        Ok(outcome)
    }

    /// Burn one verification against a throwaway hash. Always `false`.
    pub async fn verify_dummy(&self, password: &str) -> Result<bool, AppError> {
        let dummy = match self.dummy_hash.get() {
            Some(hash) => hash.clone(),
            None => {
                let hash = self.hash("monoko-timing-equalizer").await?;
                self.dummy_hash.get_or_init(|| hash).clone()
            }
        };
        self.verify(password, &dummy).await?;
        Ok(false)
    }

    async fn run<T, F>(&self, job: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Result<T, bcrypt::BcryptError> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Hash pool closed: {}", e)))?;

        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Hash task failed: {}", e)))?
            .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt error: {}", e)))
    }
}
