// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use club_leaderboard::db::RecordStore;
use club_leaderboard::services::SyncEngine;
use serde_json::{json, Value};

/// Check if the Firestore emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Sync engine over a fresh in-memory store.
#[allow(dead_code)]
pub fn test_engine() -> SyncEngine {
    SyncEngine::new(RecordStore::in_memory())
}

/// A sparse club-feed payload: no activity ID, no start date, athlete
/// reduced to first/last name.
#[allow(dead_code)]
pub fn club_raw(first: &str, last: &str, name: &str, distance: f64, moving_time: i64) -> Value {
    json!({
        "athlete": { "firstname": first, "lastname": last },
        "name": name,
        "type": "Run",
        "distance": distance,
        "moving_time": moving_time,
        "elapsed_time": moving_time,
        "total_elevation_gain": 10.0,
    })
}

/// A full athlete-feed payload, as returned by the activities endpoint.
#[allow(dead_code)]
pub fn api_raw(
    activity_id: u64,
    athlete_id: u64,
    name: &str,
    distance: f64,
    moving_time: i64,
    start_date: &str,
) -> Value {
    json!({
        "id": activity_id,
        "athlete": { "id": athlete_id, "firstname": "Maria", "lastname": "Silva" },
        "name": name,
        "type": "Run",
        "distance": distance,
        "moving_time": moving_time,
        "elapsed_time": moving_time + 20,
        "total_elevation_gain": 42.0,
        "start_date": start_date,
    })
}
