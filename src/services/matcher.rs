// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Duplicate matching: does an incoming record re-observe a stored activity?
//!
//! No shared primary key exists across sources, so matching is tiered: the
//! Strava activity ID when both sides carry one, start-time proximity when
//! timestamps exist, and numeric closeness as a last resort. Tolerances
//! tighten as corroborating signals disappear, to bound false-positive
//! merges. The thresholds below are deliberate heuristics; changing any of
//! them changes matching behavior and is covered by the scenario tests.
//!
//! Candidates must be pre-scoped by athlete identity key before calling; the
//! matcher never scans the full record set.

use crate::models::CanonicalActivity;
use crate::time_utils::parse_start_date;

/// Hard cap on the candidate list considered per incoming record.
pub const MAX_CANDIDATES: usize = 50;

/// Start-time delta (milliseconds) treated as definitively the same activity.
const START_DELTA_STRICT_MS: i64 = 2 * 60 * 1000;
/// Start-time delta (milliseconds) still considered, with corroboration.
const START_DELTA_LOOSE_MS: i64 = 5 * 60 * 1000;

/// Distance tolerance (meters / fraction) when no start-date signal exists.
const DISTANCE_TOLERANCE_STRICT_M: f64 = 10.0;
const DISTANCE_TOLERANCE_STRICT_PCT: f64 = 0.02;
/// Distance tolerance (meters / fraction) for the looser tiers.
const DISTANCE_TOLERANCE_LOOSE_M: f64 = 50.0;
const DISTANCE_TOLERANCE_LOOSE_PCT: f64 = 0.03;

/// Duration tolerance (seconds) when no start-date signal exists.
const TIME_TOLERANCE_STRICT_S: i64 = 10;
/// Duration tolerance (seconds) for the looser tiers.
const TIME_TOLERANCE_LOOSE_S: i64 = 60;

/// Elevation tolerance (meters) corroborating a strict numeric match.
const ELEVATION_TOLERANCE_M: f64 = 5.0;

/// How two records matched, ordered by ascending confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchType {
    /// Numeric closeness with same source tag and no start dates anywhere
    LooseFallback,
    /// Tight numeric closeness plus name or elevation corroboration
    StrictNumeric,
    /// Start times within five minutes plus numeric corroboration
    StartDateLoose,
    /// Start times within two minutes
    StartDateStrict,
    /// Identical Strava activity ID
    StravaId,
}

impl MatchType {
    /// Definitive matches authorize an in-place update; everything weaker
    /// only reports probable duplication.
    pub fn is_definitive(self) -> bool {
        matches!(self, MatchType::StravaId | MatchType::StartDateStrict)
    }
}

/// A successful match against one stored candidate.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateMatch<'a> {
    pub target: &'a CanonicalActivity,
    pub match_type: MatchType,
}

/// Match an incoming record against a pre-scoped candidate list.
///
/// Candidates are tried in order and the first one satisfying any rule wins;
/// there is no best-of-all-candidates search. Returns `None` when nothing
/// matches.
pub fn find_match<'a>(
    incoming: &CanonicalActivity,
    candidates: &'a [CanonicalActivity],
) -> Option<DuplicateMatch<'a>> {
    for candidate in candidates.iter().take(MAX_CANDIDATES) {
        if let Some(match_type) = match_candidate(incoming, candidate) {
            tracing::debug!(
                ?match_type,
                candidate_id = candidate.id.as_deref().unwrap_or(""),
                "Duplicate candidate matched"
            );
            return Some(DuplicateMatch {
                target: candidate,
                match_type,
            });
        }
    }
    None
}

/// Evaluate the rule tiers for one candidate, highest confidence first.
fn match_candidate(incoming: &CanonicalActivity, candidate: &CanonicalActivity) -> Option<MatchType> {
    // Tier 1: identical Strava activity ID is definitive regardless of any
    // other field drift (titles get edited, distances get corrected).
    if let (Some(a), Some(b)) = (incoming.strava_id.as_deref(), candidate.strava_id.as_deref()) {
        if a == b {
            return Some(MatchType::StravaId);
        }
    }

    let incoming_start = incoming.start_date.as_deref().and_then(parse_start_date);
    let candidate_start = candidate.start_date.as_deref().and_then(parse_start_date);

    if let (Some(a), Some(b)) = (incoming_start, candidate_start) {
        let delta_ms = (a - b).num_milliseconds().abs();

        // Tier 2: provider timestamps are authoritative when both exist.
        if delta_ms <= START_DELTA_STRICT_MS {
            return Some(MatchType::StartDateStrict);
        }

        // Tier 3: nearby start plus corroborating numbers.
        if delta_ms <= START_DELTA_LOOSE_MS
            && distance_within(
                incoming.distance,
                candidate.distance,
                DISTANCE_TOLERANCE_LOOSE_M,
                DISTANCE_TOLERANCE_LOOSE_PCT,
            )
            && duration_within(incoming, candidate, TIME_TOLERANCE_LOOSE_S)
        {
            return Some(MatchType::StartDateLoose);
        }

        // Two trusted timestamps further apart are different activities; do
        // not fall through to the numeric tiers.
        return None;
    }

    // Tier 4: no usable start-date signal. Numeric closeness alone is not
    // distinctive enough, so require the title or the elevation to agree.
    if distance_within(
        incoming.distance,
        candidate.distance,
        DISTANCE_TOLERANCE_STRICT_M,
        DISTANCE_TOLERANCE_STRICT_PCT,
    ) && duration_within(incoming, candidate, TIME_TOLERANCE_STRICT_S)
        && (titles_equivalent(&incoming.name, &candidate.name)
            || (incoming.elevation_gain - candidate.elevation_gain).abs() <= ELEVATION_TOLERANCE_M)
    {
        return Some(MatchType::StrictNumeric);
    }

    // Tier 5: last resort, only when neither record ever had a start date
    // and both carry the provider's source tag (manual imports are too noisy
    // for this tier).
    if incoming.start_date.is_none()
        && candidate.start_date.is_none()
        && incoming.source == candidate.source
        && is_provider_source(&candidate.source)
        && distance_within(
            incoming.distance,
            candidate.distance,
            DISTANCE_TOLERANCE_LOOSE_M,
            DISTANCE_TOLERANCE_LOOSE_PCT,
        )
        && duration_within(incoming, candidate, TIME_TOLERANCE_LOOSE_S)
    {
        return Some(MatchType::LooseFallback);
    }

    None
}

/// Whether a source tag identifies records fetched from Strava.
fn is_provider_source(source: &str) -> bool {
    source.starts_with("strava")
}

/// Absolute-or-relative distance closeness.
fn distance_within(a: f64, b: f64, abs_m: f64, pct: f64) -> bool {
    let diff = (a - b).abs();
    diff <= abs_m || diff <= pct * a.max(b)
}

/// Moving time or elapsed time within tolerance.
fn duration_within(a: &CanonicalActivity, b: &CanonicalActivity, tolerance_s: i64) -> bool {
    (a.moving_time - b.moving_time).abs() <= tolerance_s
        || (a.elapsed_time - b.elapsed_time).abs() <= tolerance_s
}

/// Case- and whitespace-insensitive title equality.
fn titles_equivalent(a: &str, b: &str) -> bool {
    let fold = |s: &str| {
        s.split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    };
    fold(a) == fold(b)
}
