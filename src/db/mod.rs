//! Persistence layer.
//!
//! Handlers and services talk to storage only through [`UserRepository`].
//! The shipped backend is [`InMemoryUserStore`]; a database-backed
//! implementation must provide the same atomic insert and update semantics.

pub mod memory;

pub use memory::InMemoryUserStore;

use async_trait::async_trait;

use crate::models::User;

/// In-place mutation applied to a stored user under the store's lock.
pub type UserPatch = Box<dyn FnOnce(&mut User) + Send>;

/// Storage failures surfaced to the service layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A user with this email already exists")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Capability interface over user storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::DuplicateEmail`] if the
    /// email is taken; concurrent inserts of one email have one winner.
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Atomically apply `patch` to the user and return the result.
    /// `id` and `email` are restored after the patch runs.
    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;
}

/// Normalized lookup key for an email address.
pub fn email_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
