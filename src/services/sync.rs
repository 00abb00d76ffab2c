// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync orchestration.
//!
//! Handles the core workflow for a batch of raw activities:
//! 1. Normalize each payload to a canonical record
//! 2. Resolve the athlete identity key and scope duplicate candidates to it
//! 3. Match against stored records plus this pass's staged records
//! 4. Decide update-in-place vs create
//! 5. Commit every staged write for the pass as one batch
//!
//! Passes are serialized behind a mutex: two concurrently-processed
//! near-duplicate records could otherwise both decide "create" against each
//! other. Staged records participate in candidate lookup for the same reason.

use std::collections::{HashMap, HashSet};

use futures_util::{stream, StreamExt};
use serde_json::Value;

use crate::db::{RecordStore, WriteOp};
use crate::error::{AppError, Result};
use crate::models::{CanonicalActivity, LeaderboardEntry, RosterMember};
use crate::services::aggregate::{aggregate, leaderboard};
use crate::services::cleanup::{plan_cleanup, CleanupGroup};
use crate::services::decision::{decide, merge_into, record_id};
use crate::services::identity::{resolve_athlete_key, MetaDirectory};
use crate::services::matcher::{find_match, MAX_CANDIDATES};
use crate::services::normalize::normalize;
use crate::time_utils;

/// Concurrency limit for per-athlete candidate prefetches.
const MAX_CONCURRENT_LOOKUPS: usize = 10;

/// Counters for one ingest pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Raw payloads received
    pub received: usize,
    /// Records inserted (including preserved probable duplicates)
    pub created: usize,
    /// Stored records merged in place
    pub updated: usize,
    /// Records with no resolvable athlete identity
    pub unattributed: usize,
}

/// Orchestrates ingest, aggregation, and cleanup passes over one store.
pub struct SyncEngine {
    store: RecordStore,
    pass_lock: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            pass_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Ingest a batch of raw activity payloads from one source.
    ///
    /// All persistence effects are staged and committed in one batch at the
    /// end; a failed commit publishes nothing.
    pub async fn ingest_batch(&self, raws: &[Value], source: &str) -> Result<IngestSummary> {
        let _pass = self.pass_lock.lock().await;
        let now = time_utils::now_millis();

        let mut summary = IngestSummary {
            received: raws.len(),
            ..IngestSummary::default()
        };

        // Normalize the whole batch first and resolve identity keys.
        let mut records: Vec<CanonicalActivity> = Vec::with_capacity(raws.len());
        for raw in raws {
            let mut raw = raw.clone();
            if let Some(fields) = raw.as_object_mut() {
                fields
                    .entry("source")
                    .or_insert_with(|| Value::String(source.to_string()));
                fields.entry("fetched_at").or_insert_with(|| Value::from(now));
            }
            let mut record = normalize(&raw);
            record.athlete_key = resolve_athlete_key(&record);
            if record.athlete_key.is_none() {
                summary.unattributed += 1;
            }
            records.push(record);
        }

        // Prefetch stored candidate lists for every identity in the batch.
        // The pass lock keeps the store stable underneath us.
        let keys: HashSet<String> = records
            .iter()
            .filter_map(|r| r.athlete_key.clone())
            .collect();
        let stored_candidates: HashMap<String, Vec<CanonicalActivity>> = stream::iter(keys)
            .map(|key| {
                let store = self.store.clone();
                async move {
                    let candidates = store.find_candidates(&key, MAX_CANDIDATES as u32).await?;
                    Ok::<_, AppError>((key, candidates))
                }
            })
            .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_>>()?;

        // Staged writes for this pass, keyed by document ID and kept in
        // insertion order. Staged records are also duplicate candidates for
        // the rest of the pass.
        let mut staged_order: Vec<String> = Vec::new();
        let mut staged: HashMap<String, CanonicalActivity> = HashMap::new();

        for mut record in records {
            let athlete_key = record.athlete_key.clone();

            let mut candidates = match athlete_key.as_deref() {
                Some(key) => stored_candidates.get(key).cloned().unwrap_or_default(),
                None => Vec::new(),
            };
            if let Some(key) = athlete_key.as_deref() {
                for staged_id in &staged_order {
                    let staged_record = &staged[staged_id];
                    if staged_record.athlete_key.as_deref() == Some(key) {
                        candidates.push(staged_record.clone());
                    }
                }
            }

            // A target with no stored ID cannot be addressed for an update;
            // falling through to create is the fail-safe direction.
            let update = {
                let matched = find_match(&record, &candidates);
                decide(matched.as_ref()).target.and_then(|target| {
                    let doc_id = target.id.clone()?;
                    // Merge against the freshest staged version if this pass
                    // already touched the target.
                    let base = staged.get(&doc_id).cloned().unwrap_or_else(|| target.clone());
                    Some((doc_id, merge_into(&base, &record)))
                })
            };

            match update {
                Some((doc_id, merged)) => {
                    tracing::debug!(doc_id = %doc_id, "Merging re-observed activity");
                    summary.updated += 1;
                    if !staged.contains_key(&doc_id) {
                        staged_order.push(doc_id.clone());
                    }
                    staged.insert(doc_id, merged);
                }
                None => {
                    let doc_id = record_id(&record, athlete_key.as_deref());
                    record.id = Some(doc_id.clone());
                    if record.created_at.is_none() {
                        record.created_at = Some(now);
                    }
                    summary.created += 1;
                    if !staged.contains_key(&doc_id) {
                        staged_order.push(doc_id.clone());
                    }
                    staged.insert(doc_id, record);
                }
            }
        }

        let ops: Vec<WriteOp> = staged_order
            .iter()
            .map(|doc_id| WriteOp::PutActivity(staged[doc_id].clone()))
            .collect();
        self.store.commit_batch(&ops).await?;

        tracing::info!(
            source,
            received = summary.received,
            created = summary.created,
            updated = summary.updated,
            unattributed = summary.unattributed,
            "Ingest pass committed"
        );
        Ok(summary)
    }

    /// Recompute the leaderboard snapshot wholesale and replace the stored
    /// one in a single batch. Readers see the old snapshot or the new one,
    /// never a mix.
    pub async fn rebuild_snapshot(
        &self,
        roster: Option<&[RosterMember]>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let _pass = self.pass_lock.lock().await;
        let now = time_utils::now_millis();

        let records = self.store.list_activities().await?;
        let meta = MetaDirectory::from_entries(self.store.list_athlete_meta().await?);

        let summaries = aggregate(&records, roster, now);
        let board = leaderboard(summaries, &meta);

        let fresh_keys: HashSet<&str> = board.iter().map(|e| e.athlete_key.as_str()).collect();
        let mut ops: Vec<WriteOp> = self
            .store
            .list_summaries()
            .await?
            .into_iter()
            .filter(|stale| !fresh_keys.contains(stale.athlete_key.as_str()))
            .map(|stale| WriteOp::DeleteSummary(stale.athlete_key))
            .collect();
        ops.extend(board.iter().cloned().map(WriteOp::PutSummary));

        self.store.commit_batch(&ops).await?;

        tracing::info!(
            records = records.len(),
            athletes = board.len(),
            "Leaderboard snapshot rebuilt"
        );
        Ok(board)
    }

    /// Compute a duplicate-group cleanup plan over the full record set.
    /// Advisory only; nothing is deleted here.
    pub async fn plan_cleanup_pass(&self, distance_unit_m: f64) -> Result<Vec<CleanupGroup>> {
        let _pass = self.pass_lock.lock().await;
        let records = self.store.list_activities().await?;
        Ok(plan_cleanup(&records, distance_unit_m))
    }

    /// Apply a cleanup plan, deleting every discarded record in one batch.
    /// Returns the number of deletions.
    pub async fn apply_cleanup(&self, plan: &[CleanupGroup]) -> Result<usize> {
        let _pass = self.pass_lock.lock().await;

        let ops: Vec<WriteOp> = plan
            .iter()
            .flat_map(|group| group.discard_ids().map(|id| WriteOp::DeleteActivity(id.to_string())))
            .collect();
        let deleted = ops.len();
        self.store.commit_batch(&ops).await?;

        tracing::info!(groups = plan.len(), deleted, "Cleanup applied");
        Ok(deleted)
    }
}
