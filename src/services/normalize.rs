// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field normalization: heterogeneous raw payloads to canonical records.
//!
//! Raw activities arrive with inconsistent field names, types, and casing
//! depending on where they came from (Strava API pages, manual imports,
//! spreadsheet batches). `normalize` is pure and total: it always produces a
//! record, coercing unusable values to defaults instead of failing.
//!
//! Each target field has one ordered table of candidate keys, probed in
//! priority order. Keep new spellings in these tables rather than inline.

use serde_json::Value;

use crate::models::CanonicalActivity;
use crate::time_utils;

/// Candidate keys for `distance`, in priority order (meters).
const DISTANCE_KEYS: &[&str] = &["distance", "distance_m", "distanceMeters", "distance_meters"];

/// Candidate keys for `moving_time`, in priority order (seconds).
const MOVING_TIME_KEYS: &[&str] = &["moving_time", "movingTime"];

/// Candidate keys for `elevation_gain`, in priority order (meters).
const ELEVATION_KEYS: &[&str] = &["total_elevation_gain", "elev_total", "elevation"];

/// Candidate keys for the Strava activity ID, in priority order.
const STRAVA_ID_KEYS: &[&str] = &["strava_id", "strava_activity_id"];

/// Normalize a raw activity payload into a canonical record.
///
/// Normalizing an already-normalized record is a no-op, so records read back
/// from the store can be re-normalized safely.
pub fn normalize(raw: &Value) -> CanonicalActivity {
    let activity_type = string_field(raw, "type")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Run".to_string());

    let name = string_field(raw, "name")
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{} Activity", activity_type));

    // `sport_type` defaults from `type` only when the input carried a type;
    // an input with neither stays unclassified.
    let sport_type = string_field(raw, "sport_type").or_else(|| string_field(raw, "type"));

    let moving_time = first_number(raw, MOVING_TIME_KEYS)
        .map(|v| v.round() as i64)
        .unwrap_or(0);
    let elapsed_time = number_field(raw, "elapsed_time")
        .map(|v| v.round() as i64)
        .unwrap_or(moving_time);

    CanonicalActivity {
        // Document IDs are strings; a numeric `id` is a Strava activity ID
        // and is picked up below instead.
        id: raw.get("id").and_then(Value::as_str).map(str::to_string),
        athlete_id: resolve_athlete_id(raw),
        athlete_name: resolve_athlete_name(raw),
        athlete_key: string_field(raw, "athlete_key"),
        name,
        activity_type,
        sport_type,
        workout_type: string_field(raw, "workout_type"),
        distance: first_number(raw, DISTANCE_KEYS).unwrap_or(0.0),
        moving_time,
        elapsed_time,
        elevation_gain: first_number(raw, ELEVATION_KEYS).unwrap_or(0.0),
        start_date: string_field(raw, "start_date").filter(|d| !d.is_empty()),
        strava_id: resolve_strava_id(raw),
        source: string_field(raw, "source")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "manual".to_string()),
        fetched_at: integer_field(raw, "fetched_at"),
        created_at: integer_field(raw, "created_at"),
        updated_at: integer_field(raw, "updated_at").or_else(|| Some(time_utils::now_millis())),
    }
}

/// Best-effort display name: explicit field first, then the nested athlete
/// object ("first last", trimmed and space-joined), else empty.
fn resolve_athlete_name(raw: &Value) -> String {
    if let Some(name) = string_field(raw, "athlete_name").filter(|n| !n.trim().is_empty()) {
        return name.trim().to_string();
    }

    let athlete = raw.get("athlete");
    let first = athlete
        .and_then(|a| string_field(a, "firstname").or_else(|| string_field(a, "first_name")))
        .unwrap_or_default();
    let last = athlete
        .and_then(|a| string_field(a, "lastname").or_else(|| string_field(a, "last_name")))
        .unwrap_or_default();

    let joined = format!("{} {}", first.trim(), last.trim());
    joined.trim().to_string()
}

fn resolve_athlete_id(raw: &Value) -> Option<String> {
    if let Some(id) = string_field(raw, "athlete_id").filter(|v| !v.is_empty()) {
        return Some(id);
    }
    let athlete = raw.get("athlete")?;
    athlete
        .get("id")
        .or_else(|| athlete.get("id_str"))
        .and_then(coerce_string)
}

fn resolve_strava_id(raw: &Value) -> Option<String> {
    for key in STRAVA_ID_KEYS {
        if let Some(id) = raw.get(*key).and_then(coerce_string).filter(|v| !v.is_empty()) {
            return Some(id);
        }
    }
    // A numeric top-level `id` came from the Strava API.
    raw.get("id").and_then(Value::as_i64).map(|v| v.to_string())
}

/// First defined, non-null, non-empty value among `keys`, coerced to f64.
fn first_number(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| number_field(raw, key))
}

fn number_field(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(coerce_f64)
}

fn integer_field(raw: &Value, key: &str) -> Option<i64> {
    raw.get(key).and_then(coerce_f64).map(|v| v.round() as i64)
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(coerce_string)
}

/// Coerce a JSON value to f64: numbers directly, numeric strings parsed.
/// Anything else (including empty strings) is treated as absent.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON value to a string: strings directly, numbers stringified.
fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
