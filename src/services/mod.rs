// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod password;
pub mod tokens;

pub use credentials::CredentialService;
pub use password::PasswordHasher;
pub use tokens::{Claims, TokenError, TokenKind, TokenPair, TokenService};
