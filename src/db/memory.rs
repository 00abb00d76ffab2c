// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store backend for tests and local runs.
//!
//! Scans return documents in id order so candidate lists and batch passes
//! behave deterministically, which the dedup tests rely on.

use std::sync::Arc;

use dashmap::DashMap;

use crate::models::{AthleteMeta, CanonicalActivity, LeaderboardEntry};

#[derive(Clone, Default)]
pub struct MemoryBackend {
    activities: Arc<DashMap<String, CanonicalActivity>>,
    meta: Arc<DashMap<String, AthleteMeta>>,
    summaries: Arc<DashMap<String, LeaderboardEntry>>,
}

impl MemoryBackend {
    pub fn get_activity(&self, id: &str) -> Option<CanonicalActivity> {
        self.activities.get(id).map(|entry| entry.value().clone())
    }

    pub fn find_candidates(&self, athlete_key: &str, limit: usize) -> Vec<CanonicalActivity> {
        let mut matches: Vec<CanonicalActivity> = self
            .activities
            .iter()
            .filter(|entry| entry.value().athlete_key.as_deref() == Some(athlete_key))
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches.truncate(limit);
        matches
    }

    pub fn list_activities(&self) -> Vec<CanonicalActivity> {
        let mut all: Vec<CanonicalActivity> = self
            .activities
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn put_activity(&self, id: &str, record: CanonicalActivity) {
        self.activities.insert(id.to_string(), record);
    }

    pub fn delete_activity(&self, id: &str) {
        self.activities.remove(id);
    }

    pub fn list_meta(&self) -> Vec<AthleteMeta> {
        let mut all: Vec<AthleteMeta> = self.meta.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    pub fn put_meta(&self, meta: AthleteMeta) {
        self.meta.insert(meta.key.clone(), meta);
    }

    pub fn list_summaries(&self) -> Vec<LeaderboardEntry> {
        let mut all: Vec<LeaderboardEntry> =
            self.summaries.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.athlete_key.cmp(&b.athlete_key));
        all
    }

    pub fn put_summary(&self, entry: LeaderboardEntry) {
        self.summaries.insert(entry.athlete_key.clone(), entry);
    }

    pub fn delete_summary(&self, athlete_key: &str) {
        self.summaries.remove(athlete_key);
    }
}
