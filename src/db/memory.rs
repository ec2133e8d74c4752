// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory user store backed by `DashMap`.
//!
//! Users are keyed by normalized email. A secondary index maps the
//! immutable user id back to that key. Entry-level locking in `DashMap`
//! provides the atomic insert-if-absent and read-modify-write semantics
//! the repository contract requires. Nothing survives a restart.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{email_key, StoreError, UserPatch, UserRepository};
use crate::models::User;

/// Process-local user repository.
#[derive(Default)]
pub struct InMemoryUserStore {
    /// email key -> user
    users: DashMap<String, User>,
    /// user id -> email key
    ids: DashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        match self.users.entry(email_key(&user.email)) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                // Index the id while the email shard is still locked so a
                // concurrent find_by_id never sees a half-inserted user.
                self.ids.insert(user.id.clone(), slot.key().clone());
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&email_key(email)).map(|u| u.clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let Some(key) = self.ids.get(id).map(|k| k.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&key).map(|u| u.clone()))
    }

    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, StoreError> {
        let key = self
            .ids
            .get(id)
            .map(|k| k.clone())
            .ok_or(StoreError::UserNotFound)?;
        let mut entry = self.users.get_mut(&key).ok_or(StoreError::UserNotFound)?;

        let (id, email) = (entry.id.clone(), entry.email.clone());
        patch(entry.value_mut());
        // Identity fields are fixed at creation.
        entry.id = id;
        entry.email = email;

        Ok(entry.clone())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.iter().map(|u| u.value().clone()).collect())
    }
}
