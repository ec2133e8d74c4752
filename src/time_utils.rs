// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_client_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_datetime() {
        let dt = parse_client_datetime("2030-05-01T10:30:00+02:00").unwrap();
        assert_eq!(format_utc_rfc3339(dt), "2030-05-01T08:30:00Z");

        let day = parse_client_datetime("2030-05-01").unwrap();
        assert_eq!(format_utc_rfc3339(day), "2030-05-01T00:00:00Z");

        assert!(parse_client_datetime("next tuesday").is_none());
    }
}
