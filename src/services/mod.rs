// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregate;
pub mod cleanup;
pub mod decision;
pub mod identity;
pub mod matcher;
pub mod normalize;
pub mod strava;
pub mod sync;

pub use aggregate::{aggregate, leaderboard};
pub use cleanup::{plan_cleanup, CleanupGroup};
pub use decision::{decide, merge_into, record_id, MergeDecision, RecordAction};
pub use identity::{name_key, resolve_athlete_key, MetaDirectory};
pub use matcher::{find_match, DuplicateMatch, MatchType, MAX_CANDIDATES};
pub use normalize::normalize;
pub use strava::StravaClient;
pub use sync::{IngestSummary, SyncEngine};
