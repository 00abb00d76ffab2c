// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline duplicate-group cleanup.
//!
//! The per-insert path is deliberately conservative toward duplication, so
//! near-duplicates accumulate over time. This batch pass groups the full
//! record set by identity + date + coarsely-rounded distance and picks one
//! canonical survivor per group. The output is advisory: deletion is a
//! separate, explicitly invoked step.

use std::collections::HashMap;

use crate::models::CanonicalActivity;
use crate::services::identity::resolve_athlete_key;
use crate::time_utils::date_portion;

/// One group of likely-duplicate records: a survivor and the remainder.
#[derive(Debug, Clone)]
pub struct CleanupGroup {
    pub keep: CanonicalActivity,
    pub discard: Vec<CanonicalActivity>,
}

impl CleanupGroup {
    /// Document IDs slated for deletion.
    pub fn discard_ids(&self) -> impl Iterator<Item = &str> {
        self.discard.iter().filter_map(|r| r.id.as_deref())
    }
}

/// Group likely duplicates across the whole record set.
///
/// `distance_unit_m` is the rounding unit for the distance component of the
/// grouping key; coarser units catch more normalization drift at the cost of
/// more false groupings. The unit is configuration, not something this module
/// picks. Records with no resolvable athlete key are skipped: grouping
/// anonymous records across athletes would invite false merges.
///
/// Only groups with more than one member are returned.
pub fn plan_cleanup(records: &[CanonicalActivity], distance_unit_m: f64) -> Vec<CleanupGroup> {
    // Insertion-ordered grouping so the final tie-break ("first record
    // encountered") is stable across runs.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&CanonicalActivity>> = HashMap::new();

    for record in records {
        let Some(athlete_key) = resolve_athlete_key(record) else {
            continue;
        };
        let key = group_key(&athlete_key, record, distance_unit_m);
        let members = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        members.push(record);
    }

    let mut plan = Vec::new();
    for key in &order {
        let members = &groups[key];
        if members.len() < 2 {
            continue;
        }
        let keep_idx = select_keeper(members);
        plan.push(CleanupGroup {
            keep: members[keep_idx].clone(),
            discard: members
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != keep_idx)
                .map(|(_, r)| (*r).clone())
                .collect(),
        });
    }

    tracing::info!(
        records = records.len(),
        duplicate_groups = plan.len(),
        "Cleanup plan computed"
    );
    plan
}

/// Grouping key: identity + start-date date portion + rounded distance.
fn group_key(athlete_key: &str, record: &CanonicalActivity, distance_unit_m: f64) -> String {
    let date = record.start_date.as_deref().map(date_portion).unwrap_or("");
    let distance_bucket = (record.distance / distance_unit_m).round() as i64;
    format!("{}|{}|{}", athlete_key, date, distance_bucket)
}

/// Pick the canonical record of a group. First applicable rule wins:
/// Strava ID, then provider source, then earliest timestamp (missing
/// timestamps sort last), then the first record encountered.
fn select_keeper(members: &[&CanonicalActivity]) -> usize {
    if let Some(idx) = members.iter().position(|r| r.strava_id.is_some()) {
        return idx;
    }
    if let Some(idx) = members.iter().position(|r| r.source.starts_with("strava")) {
        return idx;
    }

    let mut best = 0;
    let mut best_ts = members[0].earliest_timestamp();
    for (idx, record) in members.iter().enumerate().skip(1) {
        let ts = record.earliest_timestamp();
        // Strictly-less keeps the earlier-encountered record on ties.
        if ts < best_ts {
            best = idx;
            best_ts = ts;
        }
    }
    best
}
