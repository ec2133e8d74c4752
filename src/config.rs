//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file is honoured for local
//! development.

use std::env;
use std::time::Duration;

/// Signing secret used when `JWT_SECRET` is unset outside production.
const DEV_JWT_SECRET: &str = "monoko-default-secret-change-in-production";

/// Deployment environment, controls how much error detail is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// HMAC key for access and refresh tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Lifetime of access tokens
    pub access_token_ttl: Duration,
    /// Lifetime of refresh tokens
    pub refresh_token_ttl: Duration,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Maximum number of password hashes computed at once
    pub hash_concurrency: usize,
    /// Insert the demo account at startup
    pub seed_demo_users: bool,
}

impl Config {
    /// Default config for testing only.
    ///
    /// Uses the minimum bcrypt cost so tests that register users stay fast.
    pub fn test_default() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            access_token_ttl: Duration::from_secs(60 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            bcrypt_cost: 4,
            hash_concurrency: 4,
            seed_demo_users: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment = Environment::parse(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret.trim().as_bytes().to_vec(),
            _ if environment == Environment::Production => {
                return Err(ConfigError::Missing("JWT_SECRET"))
            }
            _ => {
                tracing::warn!("JWT_SECRET not set, using development default");
                DEV_JWT_SECRET.as_bytes().to_vec()
            }
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            environment,
            jwt_secret,
            access_token_ttl: duration_var("JWT_EXPIRE", "7d")?,
            refresh_token_ttl: duration_var("REFRESH_TOKEN_EXPIRE", "30d")?,
            bcrypt_cost: number_var("BCRYPT_COST", 10)?,
            hash_concurrency: number_var("HASH_CONCURRENCY", 4)?,
            seed_demo_users: env::var("SEED_DEMO_USERS")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn duration_var(name: &'static str, default: &str) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_duration(&raw).ok_or(ConfigError::Invalid { name, value: raw })
}

fn number_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Parse a duration such as `90s`, `15m`, `12h` or `7d`. A bare number is seconds.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits.parse().ok()?;
    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return None,
    };
    if amount == 0 {
        return None;
    }
    Some(Duration::from_secs(amount.checked_mul(multiplier)?))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
