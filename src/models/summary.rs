// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-athlete leaderboard aggregates.
//!
//! Summaries are recomputed wholesale on each aggregation pass and replaced
//! in one batch; nothing ever partially mutates a stored summary.

use serde::{Deserialize, Serialize};

/// Aggregated totals for one athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSummary {
    /// Display name carried from the records (or roster) that produced this
    #[serde(default)]
    pub athlete_name: String,
    /// Total distance in meters
    #[serde(default)]
    pub distance: f64,
    /// Number of activities
    #[serde(default)]
    pub count: u32,
    /// Longest single activity distance in meters
    #[serde(default)]
    pub longest: f64,
    /// Total moving time in seconds
    #[serde(default)]
    pub moving_time: i64,
    /// Total elevation gain in meters
    #[serde(default)]
    pub elevation_gain: f64,
    /// Average pace in seconds per kilometer; `None` when distance is zero
    #[serde(default)]
    pub avg_pace: Option<i64>,
    /// When this summary was computed (epoch milliseconds)
    #[serde(default)]
    pub updated_at: i64,
}

impl AggregatedSummary {
    /// Zero-valued summary for a roster member with no matched activity.
    pub fn empty(athlete_name: &str, now_millis: i64) -> Self {
        Self {
            athlete_name: athlete_name.to_string(),
            distance: 0.0,
            count: 0,
            longest: 0.0,
            moving_time: 0,
            elevation_gain: 0.0,
            avg_pace: None,
            updated_at: now_millis,
        }
    }
}

/// One leaderboard row: identity key, display name, and totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub athlete_key: String,
    pub athlete_display: String,
    pub summary: AggregatedSummary,
}

/// A known club member supplied by the external membership sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterMember {
    /// Strava athlete ID, when the membership sync has one
    #[serde(default)]
    pub id: Option<String>,
    /// Member display name
    pub name: String,
}
