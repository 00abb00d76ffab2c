// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Canonical activity record for storage and matching.

use serde::{Deserialize, Serialize};

/// Normalized activity record, the unit the dedup engine operates on.
///
/// Raw payloads (Strava API pages, manual imports) are turned into this shape
/// by `services::normalize` before anything else touches them. All numeric
/// fields are guaranteed present after normalization; missing inputs
/// normalize to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalActivity {
    /// Store document ID; absent until the record is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Strava athlete ID (stringified), when known
    #[serde(default)]
    pub athlete_id: Option<String>,
    /// Best-effort display name ("first last"), empty if underivable
    #[serde(default)]
    pub athlete_name: String,
    /// Derived identity key used to scope candidate lookups; filled in by
    /// the sync engine before the record is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athlete_key: Option<String>,
    /// Activity title
    pub name: String,
    /// Activity category (Run, Ride, ...)
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default)]
    pub workout_type: Option<String>,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: i64,
    /// Elapsed time in seconds
    #[serde(default)]
    pub elapsed_time: i64,
    /// Elevation gain in meters
    #[serde(default)]
    pub elevation_gain: f64,
    /// ISO 8601 start timestamp; strongest identity signal when present
    #[serde(default)]
    pub start_date: Option<String>,
    /// Strava activity ID (stringified); definitive identity signal
    #[serde(default)]
    pub strava_id: Option<String>,
    /// Origin tag ("strava_api", "manual", ...)
    pub source: String,
    /// When the record was fetched from the provider (epoch milliseconds)
    #[serde(default)]
    pub fetched_at: Option<i64>,
    /// When the record was first persisted (epoch milliseconds)
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Last normalization/merge time (epoch milliseconds)
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl CanonicalActivity {
    /// Earliest known timestamp among `updated_at`/`fetched_at`/`created_at`.
    ///
    /// A record with no timestamp at all sorts last (`i64::MAX`), so cleanup
    /// keep-selection prefers any timestamped record over an untimestamped
    /// one.
    pub fn earliest_timestamp(&self) -> i64 {
        [self.updated_at, self.fetched_at, self.created_at]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(i64::MAX)
    }
}
