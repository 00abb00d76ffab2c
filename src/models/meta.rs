// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Operator-edited athlete display metadata.

use serde::{Deserialize, Serialize};

/// Per-athlete display metadata, keyed by identity key.
///
/// Lifecycle is independent from activity records: entries are edited through
/// an operator-facing surface and only read here, for leaderboard display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteMeta {
    /// Identity key this entry is registered under (also the document ID)
    pub key: String,
    /// Display nickname, overrides the derived name when set
    #[serde(default)]
    pub nickname: Option<String>,
    /// Distance goal in kilometers, if the athlete set one
    #[serde(default)]
    pub goal_km: Option<f64>,
    /// Canonical full name, when the operator has corrected it
    #[serde(default)]
    pub display_name: Option<String>,
}
