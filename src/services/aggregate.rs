// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard aggregation.
//!
//! Pure fold over the deduplicated record set; recomputed from scratch each
//! pass, never incrementally mutated. Activity records are read-only here.

use std::collections::HashMap;

use crate::models::{AggregatedSummary, CanonicalActivity, LeaderboardEntry, RosterMember};
use crate::services::identity::{name_key, resolve_athlete_key, MetaDirectory};

/// Fold records into per-athlete summaries.
///
/// Records with no resolvable athlete key are silently dropped; anonymous
/// activity cannot be attributed. When a roster is supplied, every member
/// appears in the output, zero-valued if nothing matched their key, so the
/// leaderboard always lists the whole club.
pub fn aggregate(
    records: &[CanonicalActivity],
    roster: Option<&[RosterMember]>,
    now_millis: i64,
) -> HashMap<String, AggregatedSummary> {
    let mut summaries: HashMap<String, AggregatedSummary> = HashMap::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(key) = resolve_athlete_key(record) else {
            skipped += 1;
            continue;
        };

        let summary = summaries
            .entry(key)
            .or_insert_with(|| AggregatedSummary::empty(&record.athlete_name, now_millis));
        if summary.athlete_name.is_empty() && !record.athlete_name.is_empty() {
            summary.athlete_name = record.athlete_name.clone();
        }

        summary.distance += record.distance;
        summary.count += 1;
        summary.longest = summary.longest.max(record.distance);
        summary.moving_time += record.moving_time;
        summary.elevation_gain += record.elevation_gain;
    }

    for summary in summaries.values_mut() {
        summary.avg_pace = average_pace(summary.moving_time, summary.distance);
    }

    if let Some(members) = roster {
        for member in members {
            let Some(key) = roster_key(member) else {
                continue;
            };
            summaries
                .entry(key)
                .or_insert_with(|| AggregatedSummary::empty(&member.name, now_millis));
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Dropped records with no resolvable athlete");
    }
    summaries
}

/// Average pace in seconds per kilometer, `None` when no distance.
fn average_pace(moving_time_s: i64, distance_m: f64) -> Option<i64> {
    if distance_m > 0.0 {
        Some((moving_time_s as f64 / (distance_m / 1000.0)).round() as i64)
    } else {
        None
    }
}

/// Identity key for a roster member, through the same resolution the records
/// go through.
fn roster_key(member: &RosterMember) -> Option<String> {
    if let Some(id) = member.id.as_deref() {
        let id = id.trim();
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    let key = name_key(&member.name);
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Flatten summaries into leaderboard rows, sorted by total distance
/// descending (ties broken by key for a stable order). Display names resolve
/// through operator metadata first.
pub fn leaderboard(
    summaries: HashMap<String, AggregatedSummary>,
    meta: &MetaDirectory,
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = summaries
        .into_iter()
        .map(|(athlete_key, summary)| {
            let athlete_display = meta
                .display_name(&athlete_key)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if summary.athlete_name.is_empty() {
                        athlete_key.clone()
                    } else {
                        summary.athlete_name.clone()
                    }
                });
            LeaderboardEntry {
                athlete_key,
                athlete_display,
                summary,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.summary
            .distance
            .partial_cmp(&a.summary.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.athlete_key.cmp(&b.athlete_key))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: serde_json::Value) -> CanonicalActivity {
        crate::services::normalize(&fields)
    }

    fn run(athlete: &str, distance: f64, moving_time: i64) -> CanonicalActivity {
        record(json!({
            "athlete_name": athlete,
            "distance": distance,
            "moving_time": moving_time,
        }))
    }

    #[test]
    fn test_per_athlete_totals() {
        let records = vec![
            run("Athlete A", 5000.0, 1500),
            run("Athlete A", 3000.0, 900),
            run("Athlete B", 10000.0, 3000),
        ];

        let summaries = aggregate(&records, None, 0);
        assert_eq!(summaries.len(), 2);

        let a = &summaries["athlete a"];
        assert_eq!(a.distance, 8000.0);
        assert_eq!(a.count, 2);
        assert_eq!(a.longest, 5000.0);
        assert_eq!(a.moving_time, 2400);
        assert_eq!(a.avg_pace, Some(300));

        let b = &summaries["athlete b"];
        assert_eq!(b.distance, 10000.0);
        assert_eq!(b.count, 1);
        assert_eq!(b.longest, 10000.0);
        assert_eq!(b.avg_pace, Some(300));
    }

    #[test]
    fn test_zero_distance_has_no_pace() {
        let records = vec![run("Athlete A", 0.0, 600)];
        let summaries = aggregate(&records, None, 0);
        assert_eq!(summaries["athlete a"].avg_pace, None);
    }

    #[test]
    fn test_anonymous_records_dropped() {
        let records = vec![run("", 5000.0, 1500), run("Athlete A", 3000.0, 900)];
        let summaries = aggregate(&records, None, 0);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries["athlete a"].distance, 3000.0);
    }

    #[test]
    fn test_elevation_accumulates() {
        let records = vec![
            record(json!({ "athlete_name": "A", "distance": 1000.0, "elevation": 50.0 })),
            record(json!({ "athlete_name": "A", "distance": 1000.0, "total_elevation_gain": 25.0 })),
        ];
        let summaries = aggregate(&records, None, 0);
        assert_eq!(summaries["a"].elevation_gain, 75.0);
    }

    #[test]
    fn test_roster_members_zero_filled() {
        let roster = vec![
            RosterMember {
                id: None,
                name: "Quiet Member".to_string(),
            },
            RosterMember {
                id: None,
                name: "Athlete A".to_string(),
            },
        ];
        let records = vec![run("Athlete A", 5000.0, 1500)];

        let summaries = aggregate(&records, Some(&roster), 42);
        assert_eq!(summaries.len(), 2);

        let quiet = &summaries["quiet member"];
        assert_eq!(quiet.count, 0);
        assert_eq!(quiet.distance, 0.0);
        assert_eq!(quiet.avg_pace, None);
        assert_eq!(quiet.athlete_name, "Quiet Member");
        assert_eq!(quiet.updated_at, 42);

        // Active members keep their real totals.
        assert_eq!(summaries["athlete a"].count, 1);
    }

    #[test]
    fn test_leaderboard_sorted_and_display_resolved() {
        let records = vec![
            run("Athlete A", 5000.0, 1500),
            run("Athlete B", 10000.0, 3000),
        ];
        let summaries = aggregate(&records, None, 0);

        let meta = MetaDirectory::from_entries([crate::models::AthleteMeta {
            key: "athlete b".to_string(),
            nickname: Some("Speedy".to_string()),
            goal_km: None,
            display_name: None,
        }]);

        let board = leaderboard(summaries, &meta);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].athlete_key, "athlete b");
        assert_eq!(board[0].athlete_display, "Speedy");
        assert_eq!(board[1].athlete_display, "Athlete A");
    }
}
