// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Athlete identity resolution.
//!
//! Records arrive with a Strava athlete ID, a display name, or both, and the
//! same athlete's name drifts across sources (punctuation, casing, stray
//! leading characters from display scraping). Everything that groups or looks
//! up per-athlete data goes through the single `name_key` normalization here
//! so the aggregation and metadata paths can never diverge.

use std::collections::HashMap;

use crate::models::{AthleteMeta, CanonicalActivity};

/// Derive the identity key for a record.
///
/// Prefers the provider-assigned athlete ID; falls back to the normalized
/// display name. Returns `None` for anonymous records, which cannot be
/// attributed to any athlete.
pub fn resolve_athlete_key(record: &CanonicalActivity) -> Option<String> {
    if let Some(id) = record.athlete_id.as_deref() {
        let id = id.trim();
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }

    let key = name_key(&record.athlete_name);
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Normalize a display name into a lookup key.
///
/// Strips leading non-letter characters (some scraped display names carry a
/// stray leading zero or punctuation before the first letter), drops
/// punctuation, lowercases, and collapses internal whitespace. Two names
/// differing only in case, punctuation, or leading noise resolve to the same
/// key.
///
/// A fully non-letter name (e.g. "007") keeps its digits rather than
/// collapsing to nothing. Legitimately digit-prefixed names will still lose
/// their prefix; that false-merge risk is accepted for now.
pub fn name_key(name: &str) -> String {
    let trimmed = name.trim();
    let stripped = trimmed.trim_start_matches(|c: char| !c.is_alphabetic());
    let base = if stripped.is_empty() { trimmed } else { stripped };

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_alphanumeric() {
            cleaned.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First-name-only fallback key, used as the loosest metadata lookup tier.
fn first_name_key(key: &str) -> Option<&str> {
    key.split_whitespace().next()
}

/// Directory of operator-edited athlete metadata, keyed by identity key.
///
/// Each entry is registered under its primary key plus derived fallback keys
/// (punctuation-stripped variant, first name only). Fallback registrations
/// never overwrite an earlier one, so the first athlete registered under an
/// ambiguous short key keeps it.
#[derive(Debug, Default)]
pub struct MetaDirectory {
    entries: HashMap<String, AthleteMeta>,
}

impl MetaDirectory {
    pub fn from_entries(entries: impl IntoIterator<Item = AthleteMeta>) -> Self {
        let mut directory = Self::default();
        for entry in entries {
            directory.register(entry);
        }
        directory
    }

    /// Register an entry under its primary key and derived fallback keys.
    pub fn register(&mut self, meta: AthleteMeta) {
        let primary = meta.key.clone();
        let stripped = name_key(&primary);

        if !stripped.is_empty() && stripped != primary {
            self.entries
                .entry(stripped.clone())
                .or_insert_with(|| meta.clone());
        }
        if let Some(first) = first_name_key(&stripped).map(str::to_string) {
            if first != primary && first != stripped {
                self.entries.entry(first).or_insert_with(|| meta.clone());
            }
        }
        self.entries.insert(primary, meta);
    }

    /// Look up metadata for an identity key.
    ///
    /// Tries the direct key, then the punctuation-stripped variant, then the
    /// first-name-only fallback; first match wins.
    pub fn lookup(&self, key: &str) -> Option<&AthleteMeta> {
        if let Some(meta) = self.entries.get(key) {
            return Some(meta);
        }
        let stripped = name_key(key);
        if !stripped.is_empty() {
            if let Some(meta) = self.entries.get(&stripped) {
                return Some(meta);
            }
            if let Some(first) = first_name_key(&stripped) {
                return self.entries.get(first);
            }
        }
        None
    }

    /// Preferred display name for a key: nickname, then corrected name.
    pub fn display_name(&self, key: &str) -> Option<&str> {
        let meta = self.lookup(key)?;
        meta.nickname
            .as_deref()
            .or(meta.display_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(athlete_id: Option<&str>, athlete_name: &str) -> CanonicalActivity {
        let raw = serde_json::json!({
            "athlete_id": athlete_id,
            "athlete_name": athlete_name,
        });
        crate::services::normalize(&raw)
    }

    fn meta(key: &str, nickname: &str) -> AthleteMeta {
        AthleteMeta {
            key: key.to_string(),
            nickname: Some(nickname.to_string()),
            goal_km: None,
            display_name: None,
        }
    }

    #[test]
    fn test_id_preferred_over_name() {
        let record = record_with(Some("12345"), "Maria Silva");
        assert_eq!(resolve_athlete_key(&record).as_deref(), Some("12345"));
    }

    #[test]
    fn test_name_variants_collapse_to_one_key() {
        for name in ["John Doe", "john doe", "John, Doe", "0John  Doe", " .John Doe "] {
            let record = record_with(None, name);
            assert_eq!(
                resolve_athlete_key(&record).as_deref(),
                Some("john doe"),
                "variant {:?}",
                name
            );
        }
    }

    #[test]
    fn test_fully_numeric_name_keeps_digits() {
        assert_eq!(name_key("007"), "007");
    }

    #[test]
    fn test_anonymous_record_has_no_key() {
        let record = record_with(None, "");
        assert_eq!(resolve_athlete_key(&record), None);
    }

    #[test]
    fn test_lookup_order_direct_then_stripped_then_first_name() {
        let mut directory = MetaDirectory::default();
        directory.register(meta("john doe", "JD"));

        // Direct key
        assert_eq!(
            directory.lookup("john doe").unwrap().nickname.as_deref(),
            Some("JD")
        );
        // Punctuation-stripped variant of the queried key
        assert_eq!(
            directory.lookup("John, Doe").unwrap().nickname.as_deref(),
            Some("JD")
        );
        // First-name fallback
        assert_eq!(
            directory.lookup("john").unwrap().nickname.as_deref(),
            Some("JD")
        );
        assert!(directory.lookup("jane roe").is_none());
    }

    #[test]
    fn test_fallback_registration_is_first_wins() {
        let mut directory = MetaDirectory::default();
        directory.register(meta("john doe", "First"));
        directory.register(meta("john smith", "Second"));

        // Both derive the "john" fallback; the earlier registration keeps it.
        assert_eq!(
            directory.lookup("john").unwrap().nickname.as_deref(),
            Some("First")
        );
        // Primary keys are unaffected.
        assert_eq!(
            directory.lookup("john smith").unwrap().nickname.as_deref(),
            Some("Second")
        );
    }
}
