// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Custom field rules shared by request schemas.

use chrono::Utc;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::ValidationError;

use crate::time_utils::parse_client_datetime;

pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Display names are stored trimmed, so the bounds apply to the trimmed text.
pub const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=50;

/// Characters that satisfy the "special character" password requirement.
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// Session lengths (minutes) a live session can be booked for.
pub const SESSION_LENGTHS: [i64; 3] = [30, 60, 90];

pub const GAME_IDS: &[&str] = &["word-match-blitz", "echo-me", "memory-cards", "trace-it"];

/// 24-hour `HH:MM`, leading zero on the hour optional.
pub static SESSION_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("valid regex"));

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// At least one lowercase, uppercase, digit and special character.
pub fn password_strength(password: &str) -> Result<(), ValidationError> {
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if lower && upper && digit && special {
        Ok(())
    } else {
        Err(rule(
            "password_strength",
            "Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character",
        ))
    }
}

pub fn display_name(name: &str) -> Result<(), ValidationError> {
    if NAME_LENGTH.contains(&name.trim().chars().count()) {
        Ok(())
    } else {
        Err(rule("length", "Name must be between 2 and 50 characters long"))
    }
}

pub fn session_length(minutes: i64) -> Result<(), ValidationError> {
    if SESSION_LENGTHS.contains(&minutes) {
        Ok(())
    } else {
        Err(rule("session_length", "Duration must be 30, 60, or 90 minutes"))
    }
}

/// RFC3339 timestamp or `YYYY-MM-DD` strictly after now.
pub fn future_date(raw: &str) -> Result<(), ValidationError> {
    match parse_client_datetime(raw) {
        Some(when) if when > Utc::now() => Ok(()),
        Some(_) => Err(rule("future_date", "Session date must be in the future")),
        None => Err(rule("date_format", "Session date must be a valid date")),
    }
}

pub fn must_be_true(value: &bool) -> Result<(), ValidationError> {
    if *value {
        Ok(())
    } else {
        Err(rule("confirmation", "Please confirm account deletion"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength() {
        assert!(password_strength("Strong1!").is_ok());
        assert!(password_strength("TestPassword123!").is_ok());
        assert!(password_strength("strong1!").is_err());
        assert!(password_strength("STRONG1!").is_err());
        assert!(password_strength("Strong!!").is_err());
        assert!(password_strength("Strong11").is_err());
        // Only the listed specials count.
        assert!(password_strength("Strong1?").is_err());
    }

    #[test]
    fn test_display_name_counts_trimmed_chars() {
        assert!(display_name("Amani").is_ok());
        assert!(display_name("  Jo  ").is_ok());
        assert!(display_name(" A ").is_err());
        assert!(display_name("   ").is_err());
        assert!(display_name(&"é".repeat(50)).is_ok());
        assert!(display_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_session_time_pattern() {
        for ok in ["9:05", "09:05", "23:59", "00:00"] {
            assert!(SESSION_TIME.is_match(ok), "{ok}");
        }
        for bad in ["24:00", "12:60", "1230", "12:5", "noon"] {
            assert!(!SESSION_TIME.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn test_session_length() {
        assert!(session_length(60).is_ok());
        assert!(session_length(45).is_err());
    }

    #[test]
    fn test_future_date() {
        let tomorrow = (Utc::now() + chrono::Duration::days(1)).to_rfc3339();
        assert!(future_date(&tomorrow).is_ok());
        assert!(future_date("2000-01-01").is_err());
        assert!(future_date("someday").is_err());
    }
}
