// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse an activity start date.
///
/// Strava sends RFC3339 with a `Z` suffix; manual imports sometimes drop the
/// offset entirely, in which case the timestamp is taken as UTC. Returns
/// `None` for anything unparseable rather than failing the record.
pub fn parse_start_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Extract the date portion ("YYYY-MM-DD") of an ISO 8601 timestamp.
///
/// Falls back to the full value when it is too short to carry a date.
pub fn date_portion(value: &str) -> &str {
    if value.len() >= 10 {
        &value[..10]
    } else {
        value
    }
}
