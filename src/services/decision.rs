// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Merge-vs-insert policy over match results.
//!
//! Only definitive matches (Strava ID, strict start-date proximity) authorize
//! overwriting a stored record. Every probable-but-not-definitive match still
//! creates a new record: a wrong update silently corrupts a real activity,
//! while a wrong create merely leaves a duplicate for the offline cleanup
//! pass to reconcile.

use crate::models::CanonicalActivity;
use crate::services::matcher::DuplicateMatch;
use crate::time_utils;

/// What to do with an incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    /// Merge into the matched stored record
    Update,
    /// Insert as a new record, even if probably a duplicate
    Create,
}

/// Decision for one incoming record.
#[derive(Debug, Clone, Copy)]
pub struct MergeDecision<'a> {
    pub action: RecordAction,
    /// The stored record to merge into; only set for `Update`
    pub target: Option<&'a CanonicalActivity>,
}

/// Apply the merge/insert policy to a match result.
pub fn decide<'a>(matched: Option<&DuplicateMatch<'a>>) -> MergeDecision<'a> {
    match matched {
        Some(m) if m.match_type.is_definitive() => MergeDecision {
            action: RecordAction::Update,
            target: Some(m.target),
        },
        _ => MergeDecision {
            action: RecordAction::Create,
            target: None,
        },
    }
}

/// Generate a document ID for a record about to be created.
///
/// Records with a Strava activity ID get `strava_<id>`, so a retried insert
/// of the same payload overwrites itself instead of duplicating. Everything
/// else gets a composite of athlete key, rounded distance, rounded moving
/// time, and start-date token; collision-resistant but not guaranteed unique,
/// which the cleanup pass backstops.
pub fn record_id(record: &CanonicalActivity, athlete_key: Option<&str>) -> String {
    if let Some(strava_id) = record.strava_id.as_deref() {
        return format!("strava_{}", strava_id);
    }

    let key_part = urlencoding::encode(athlete_key.unwrap_or("anon")).into_owned();
    let date_part = record
        .start_date
        .as_deref()
        .map(|d| d.chars().filter(char::is_ascii_alphanumeric).collect())
        .unwrap_or_else(|| "nodate".to_string());

    format!(
        "{}_{}m_{}s_{}",
        key_part,
        record.distance.round() as i64,
        record.moving_time,
        date_part
    )
}

/// Merge an incoming record into its matched stored record.
///
/// Incoming values win for activity fields; the stored document ID, the
/// earliest creation time, and a Strava ID the incoming side lacks are
/// preserved.
pub fn merge_into(stored: &CanonicalActivity, incoming: &CanonicalActivity) -> CanonicalActivity {
    let mut merged = incoming.clone();
    merged.id = stored.id.clone();
    merged.athlete_key = incoming.athlete_key.clone().or_else(|| stored.athlete_key.clone());
    if merged.strava_id.is_none() {
        merged.strava_id = stored.strava_id.clone();
    }
    merged.created_at = match (stored.created_at, incoming.created_at) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    merged.updated_at = Some(time_utils::now_millis());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::matcher::{DuplicateMatch, MatchType};
    use serde_json::json;

    fn record(fields: serde_json::Value) -> CanonicalActivity {
        crate::services::normalize(&fields)
    }

    #[test]
    fn test_only_definitive_matches_update() {
        let stored = record(json!({ "id": "rec_1", "distance": 5000.0 }));

        for (match_type, expected) in [
            (MatchType::StravaId, RecordAction::Update),
            (MatchType::StartDateStrict, RecordAction::Update),
            (MatchType::StartDateLoose, RecordAction::Create),
            (MatchType::StrictNumeric, RecordAction::Create),
            (MatchType::LooseFallback, RecordAction::Create),
        ] {
            let matched = DuplicateMatch {
                target: &stored,
                match_type,
            };
            let decision = decide(Some(&matched));
            assert_eq!(decision.action, expected, "match type {:?}", match_type);
            assert_eq!(decision.target.is_some(), expected == RecordAction::Update);
        }
    }

    #[test]
    fn test_no_match_creates() {
        let decision = decide(None);
        assert_eq!(decision.action, RecordAction::Create);
        assert!(decision.target.is_none());
    }

    #[test]
    fn test_record_id_prefers_strava_id() {
        let rec = record(json!({ "strava_id": "16906743520", "distance": 5000.0 }));
        assert_eq!(record_id(&rec, Some("john doe")), "strava_16906743520");
    }

    #[test]
    fn test_composite_record_id() {
        let rec = record(json!({
            "distance": 5002.4,
            "moving_time": 1498,
            "start_date": "2025-11-01T06:00:00Z"
        }));
        let id = record_id(&rec, Some("john doe"));
        assert_eq!(id, "john%20doe_5002m_1498s_20251101T060000Z");

        // Deterministic: retrying the same payload yields the same ID.
        assert_eq!(id, record_id(&rec, Some("john doe")));
    }

    #[test]
    fn test_composite_id_without_key_or_date() {
        let rec = record(json!({ "distance": 980.0, "moving_time": 300 }));
        assert_eq!(record_id(&rec, None), "anon_980m_300s_nodate");
    }

    #[test]
    fn test_merge_preserves_identity_and_created_at() {
        let mut stored = record(json!({
            "id": "rec_1", "strava_id": "42", "name": "Old Title", "distance": 5000.0
        }));
        stored.created_at = Some(1000);
        let mut incoming = record(json!({ "name": "New Title", "distance": 5002.0 }));
        incoming.created_at = Some(2000);

        let merged = merge_into(&stored, &incoming);
        assert_eq!(merged.id.as_deref(), Some("rec_1"));
        assert_eq!(merged.strava_id.as_deref(), Some("42"));
        assert_eq!(merged.name, "New Title");
        assert_eq!(merged.distance, 5002.0);
        assert_eq!(merged.created_at, Some(1000));
    }
}
