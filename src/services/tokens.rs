// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access/refresh token issuance, verification and rotation.
//!
//! Both token kinds are HS256 JWTs carrying `{sub, type, iat, exp, jti}`.
//! Access tokens are stateless. Refresh tokens are additionally tracked in
//! a revocation set: a refresh token is usable only while it is present
//! there, and each successful refresh removes it (rotation). Expired
//! entries are swept every [`PRUNE_INTERVAL`] issued pairs.

use dashmap::DashMap;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{StoreError, UserRepository};
use crate::models::User;
use crate::time_utils::unix_now;

/// Issued pairs between sweeps of expired refresh tokens.
pub const PRUNE_INTERVAL: usize = 64;

/// Which of the two token roles a JWT was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Token role
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Unique token ID so tokens minted in the same second differ
    pub jti: String,
}

/// Access + refresh tokens returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/generated/")
)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token verification and rotation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenError {
    #[error("Token signature is invalid or the token is malformed")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token type. Expected {expected}, got {actual}")]
    KindMismatch {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Refresh token is not recognized")]
    UnknownToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("User lookup failed: {0}")]
    Store(String),
}

/// Issues and verifies tokens; owns the refresh-token revocation set.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    /// Live refresh tokens -> expiry (Unix seconds)
    refresh_tokens: Arc<DashMap<String, usize>>,
    issued: Arc<AtomicUsize>,
    users: Arc<dyn UserRepository>,
}

impl TokenService {
    pub fn new(
        secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
            refresh_tokens: Arc::new(DashMap::new()),
            issued: Arc::new(AtomicUsize::new(0)),
            users,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Sign a token of `kind` for `user_id`. Does not touch the revocation set.
    pub fn issue(&self, user_id: &str, kind: TokenKind) -> Result<String, TokenError> {
        let now = unix_now() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            kind,
            iat: now,
            exp: now + self.ttl(kind).as_secs() as usize,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue an access/refresh pair and start tracking the refresh token.
    pub fn issue_pair(&self, user_id: &str) -> Result<TokenPair, TokenError> {
        let access_token = self.issue(user_id, TokenKind::Access)?;
        let refresh_token = self.issue(user_id, TokenKind::Refresh)?;
        let expires_at = unix_now() as usize + self.refresh_ttl.as_secs() as usize;

        if (self.issued.fetch_add(1, Ordering::Relaxed) + 1) % PRUNE_INTERVAL == 0 {
            let pruned = self.prune_expired();
            if pruned > 0 {
                tracing::debug!(pruned, "Pruned expired refresh tokens");
            }
        }
        self.refresh_tokens.insert(refresh_token.clone(), expires_at);

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Check signature, expiry and kind. Does not consult the revocation set.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            }
        })?;

        if data.claims.kind != expected {
            return Err(TokenError::KindMismatch {
                expected,
                actual: data.claims.kind,
            });
        }

        Ok(data.claims)
    }

    /// Exchange a tracked refresh token for a fresh pair.
    ///
    /// The old token is removed from the revocation set before the new pair
    /// is issued; whichever caller's removal succeeds wins, so a token can
    /// be rotated at most once even under concurrent use.
    pub async fn refresh(&self, old_refresh_token: &str) -> Result<(User, TokenPair), TokenError> {
        if !self.refresh_tokens.contains_key(old_refresh_token) {
            return Err(TokenError::UnknownToken);
        }

        let claims = match self.verify(old_refresh_token, TokenKind::Refresh) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                self.refresh_tokens.remove(old_refresh_token);
                return Err(TokenError::Expired);
            }
            Err(e) => return Err(e),
        };

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await
            .map_err(|e| match e {
                StoreError::UserNotFound => TokenError::UserNotFound,
                other => TokenError::Store(other.to_string()),
            })?
            .ok_or(TokenError::UserNotFound)?;

        if self.refresh_tokens.remove(old_refresh_token).is_none() {
            tracing::warn!(user_id = %user.id, "Refresh token reused during rotation");
            return Err(TokenError::UnknownToken);
        }

        let pair = self.issue_pair(&user.id)?;
        tracing::debug!(user_id = %user.id, "Refresh token rotated");
        Ok((user, pair))
    }

    /// Stop accepting `refresh_token`. Unknown tokens are ignored.
    pub fn revoke(&self, refresh_token: &str) {
        if self.refresh_tokens.remove(refresh_token).is_some() {
            tracing::debug!("Refresh token revoked");
        }
    }

    pub fn is_tracked(&self, refresh_token: &str) -> bool {
        self.refresh_tokens.contains_key(refresh_token)
    }

    pub fn tracked_count(&self) -> usize {
        self.refresh_tokens.len()
    }

    /// Drop tracked refresh tokens whose expiry has passed.
    pub fn prune_expired(&self) -> usize {
        let now = unix_now() as usize;
        let before = self.refresh_tokens.len();
        self.refresh_tokens.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.refresh_tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryUserStore;
    use crate::models::Language;

    const SECRET: &[u8] = b"test_signing_key_32_bytes_long!!";

    fn service_with(store: Arc<InMemoryUserStore>) -> TokenService {
        TokenService::new(
            SECRET,
            Duration::from_secs(3600),
            Duration::from_secs(86400),
            store,
        )
    }

    async fn service_and_user() -> (TokenService, User) {
        let store = Arc::new(InMemoryUserStore::new());
        let user = store
            .insert(User::new(
                "a@x.com".to_string(),
                "A".to_string(),
                "hash".to_string(),
                Language::Swahili,
            ))
            .await
            .unwrap();
        (service_with(store), user)
    }

    fn sign_expired(user_id: &str, kind: TokenKind) -> String {
        let now = unix_now() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            kind,
            iat: now - 7200,
            exp: now - 3600,
            jti: "expired".to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_issue_verify_roundtrip() {
        let (tokens, _) = service_and_user().await;
        let token = tokens.issue("user-123", TokenKind::Access).unwrap();

        let claims = tokens.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn test_access_token_rejected_as_refresh() {
        let (tokens, _) = service_and_user().await;
        let token = tokens.issue("user-123", TokenKind::Access).unwrap();

        assert_eq!(
            tokens.verify(&token, TokenKind::Refresh),
            Err(TokenError::KindMismatch {
                expected: TokenKind::Refresh,
                actual: TokenKind::Access,
            })
        );
    }

    #[tokio::test]
    async fn test_wrong_secret_and_garbage_rejected() {
        let (tokens, _) = service_and_user().await;
        let other = TokenService::new(
            b"another_secret_entirely_32_bytes",
            Duration::from_secs(60),
            Duration::from_secs(60),
            Arc::new(InMemoryUserStore::new()),
        );
        let foreign = other.issue("user-1", TokenKind::Access).unwrap();

        assert_eq!(
            tokens.verify(&foreign, TokenKind::Access),
            Err(TokenError::InvalidSignature)
        );
        assert_eq!(
            tokens.verify("invalid.token.here", TokenKind::Access),
            Err(TokenError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn test_expired_token() {
        let (tokens, _) = service_and_user().await;
        let token = sign_expired("user-1", TokenKind::Access);
        assert_eq!(
            tokens.verify(&token, TokenKind::Access),
            Err(TokenError::Expired)
        );
    }

    #[tokio::test]
    async fn test_pair_tracks_refresh_only() {
        let (tokens, user) = service_and_user().await;
        let pair = tokens.issue_pair(&user.id).unwrap();

        assert!(tokens.is_tracked(&pair.refresh_token));
        assert!(!tokens.is_tracked(&pair.access_token));
        assert_eq!(tokens.tracked_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_is_single_use() {
        let (tokens, user) = service_and_user().await;
        let pair = tokens.issue_pair(&user.id).unwrap();

        let (refreshed_user, next) = tokens.refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(refreshed_user.id, user.id);
        assert_ne!(next.refresh_token, pair.refresh_token);
        assert!(!tokens.is_tracked(&pair.refresh_token));
        assert!(tokens.is_tracked(&next.refresh_token));

        let reuse = tokens.refresh(&pair.refresh_token).await.unwrap_err();
        assert_eq!(reuse, TokenError::UnknownToken);
    }

    #[tokio::test]
    async fn test_refresh_with_untracked_token() {
        let (tokens, user) = service_and_user().await;
        let untracked = tokens.issue(&user.id, TokenKind::Refresh).unwrap();
        assert_eq!(
            tokens.refresh(&untracked).await.unwrap_err(),
            TokenError::UnknownToken
        );
    }

    #[tokio::test]
    async fn test_refresh_for_vanished_user() {
        let (tokens, _) = service_and_user().await;
        let pair = tokens.issue_pair("user-gone").unwrap();

        assert_eq!(
            tokens.refresh(&pair.refresh_token).await.unwrap_err(),
            TokenError::UserNotFound
        );
        // Lookup failure does not consume the token.
        assert!(tokens.is_tracked(&pair.refresh_token));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_single_winner() {
        let (tokens, user) = service_and_user().await;
        let pair = tokens.issue_pair(&user.id).unwrap();

        let mut handles = vec![];
        for _ in 0..8 {
            let tokens = tokens.clone();
            let old = pair.refresh_token.clone();
            handles.push(tokio::spawn(async move { tokens.refresh(&old).await }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) => assert_eq!(e, TokenError::UnknownToken),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(tokens.tracked_count(), 1);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (tokens, user) = service_and_user().await;
        let pair = tokens.issue_pair(&user.id).unwrap();

        tokens.revoke(&pair.refresh_token);
        tokens.revoke(&pair.refresh_token);
        tokens.revoke("never-issued");

        assert_eq!(
            tokens.refresh(&pair.refresh_token).await.unwrap_err(),
            TokenError::UnknownToken
        );
    }

    #[tokio::test]
    async fn test_prune_expired() {
        let (tokens, user) = service_and_user().await;
        tokens.issue_pair(&user.id).unwrap();
        tokens
            .refresh_tokens
            .insert(sign_expired(&user.id, TokenKind::Refresh), 1);

        assert_eq!(tokens.prune_expired(), 1);
        assert_eq!(tokens.tracked_count(), 1);
    }

    #[test]
    fn test_issue_pair_sweeps_expired_tokens() {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserStore::new());
        // Zero lifetime: every tracked token is already expired at the next sweep.
        let tokens = TokenService::new(SECRET, Duration::from_secs(60), Duration::ZERO, users);

        for _ in 0..PRUNE_INTERVAL - 1 {
            tokens.issue_pair("user-1").unwrap();
        }
        assert_eq!(tokens.tracked_count(), PRUNE_INTERVAL - 1);

        let latest = tokens.issue_pair("user-1").unwrap();
        assert_eq!(tokens.tracked_count(), 1);
        assert!(tokens.is_tracked(&latest.refresh_token));
    }

    #[tokio::test]
    async fn test_expired_refresh_is_dropped() {
        let (tokens, user) = service_and_user().await;
        let stale = sign_expired(&user.id, TokenKind::Refresh);
        tokens.refresh_tokens.insert(stale.clone(), 1);

        assert_eq!(tokens.refresh(&stale).await.unwrap_err(), TokenError::Expired);
        assert!(!tokens.is_tracked(&stale));
    }
}
