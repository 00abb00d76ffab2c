// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend smoke tests. Require the emulator
//! (FIRESTORE_EMULATOR_HOST); skipped otherwise.

use club_leaderboard::db::{RecordStore, WriteOp};
use club_leaderboard::services::normalize;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_commit_and_candidate_query_roundtrip() {
    require_emulator!();

    let store = RecordStore::connect("test-project")
        .await
        .expect("Failed to connect to Firestore emulator");

    let mut record = normalize(&json!({
        "athlete_name": "Emulator Runner",
        "name": "Emulator Run",
        "distance": 5000.0,
        "moving_time": 1500,
        "source": "strava_api",
        "strava_id": "424242",
    }));
    record.athlete_key = Some("emulator runner".to_string());
    record.id = Some("strava_424242".to_string());

    store
        .commit_batch(&[WriteOp::PutActivity(record.clone())])
        .await
        .expect("commit should succeed");

    let fetched = store
        .get_activity("strava_424242")
        .await
        .expect("lookup should succeed")
        .expect("record should exist");
    assert_eq!(fetched.name, "Emulator Run");

    let candidates = store
        .find_candidates("emulator runner", 50)
        .await
        .expect("query should succeed");
    assert!(candidates
        .iter()
        .any(|c| c.id.as_deref() == Some("strava_424242")));

    store
        .commit_batch(&[WriteOp::DeleteActivity("strava_424242".to_string())])
        .await
        .expect("delete should succeed");
    assert!(store.get_activity("strava_424242").await.unwrap().is_none());
}
