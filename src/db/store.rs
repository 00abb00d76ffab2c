// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record store with typed operations.
//!
//! Firestore in production, an in-memory backend for tests and local runs.
//! The sync engine treats this as an abstract collection store: point lookup,
//! athlete-scoped candidate query, full scan, and batched commit of a pass's
//! writes.

use crate::db::{collections, memory::MemoryBackend};
use crate::error::AppError;
use crate::models::{AthleteMeta, CanonicalActivity, LeaderboardEntry};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// One staged persistence effect of a sync/cleanup pass.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create or overwrite an activity; `record.id` must be set
    PutActivity(CanonicalActivity),
    DeleteActivity(String),
    /// Create or overwrite a leaderboard summary row
    PutSummary(LeaderboardEntry),
    DeleteSummary(String),
}

/// Database client for activity records, athlete metadata, and summaries.
#[derive(Clone)]
pub struct RecordStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(MemoryBackend),
}

impl RecordStore {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn connect(project_id: &str) -> Result<Self, AppError> {
        // With the emulator environment variable set, use an unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::connect_emulator(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn connect_emulator(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| AppError::Store(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory store (tests, local one-off runs).
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryBackend::default()),
        }
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Point lookup by document ID.
    pub async fn get_activity(&self, id: &str) -> Result<Option<CanonicalActivity>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::ACTIVITIES)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Store(e.to_string())),
            Backend::Memory(memory) => Ok(memory.get_activity(id)),
        }
    }

    /// Stored records for one athlete identity key, capped at `limit`.
    ///
    /// This is the candidate scope for duplicate matching; the matcher never
    /// sees the full record set.
    pub async fn find_candidates(
        &self,
        athlete_key: &str,
        limit: u32,
    ) -> Result<Vec<CanonicalActivity>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let key = athlete_key.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::ACTIVITIES)
                    .filter(move |q| q.for_all([q.field("athlete_key").eq(key.clone())]))
                    .limit(limit)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Store(e.to_string()))
            }
            Backend::Memory(memory) => Ok(memory.find_candidates(athlete_key, limit as usize)),
        }
    }

    /// Full scan, for batch aggregation and cleanup passes.
    pub async fn list_activities(&self) -> Result<Vec<CanonicalActivity>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::ACTIVITIES)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Store(e.to_string())),
            Backend::Memory(memory) => Ok(memory.list_activities()),
        }
    }

    // ─── Athlete Metadata Operations ─────────────────────────────

    /// All operator-edited athlete metadata entries.
    pub async fn list_athlete_meta(&self) -> Result<Vec<AthleteMeta>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::ATHLETE_META)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Store(e.to_string())),
            Backend::Memory(memory) => Ok(memory.list_meta()),
        }
    }

    /// Create or update one athlete metadata entry.
    pub async fn upsert_athlete_meta(&self, meta: &AthleteMeta) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let doc_id = urlencoding::encode(&meta.key).into_owned();
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::ATHLETE_META)
                    .document_id(&doc_id)
                    .object(meta)
                    .execute()
                    .await
                    .map_err(|e| AppError::Store(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(memory) => {
                memory.put_meta(meta.clone());
                Ok(())
            }
        }
    }

    // ─── Summary Operations ──────────────────────────────────────

    /// The current leaderboard snapshot.
    pub async fn list_summaries(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::SUMMARIES)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Store(e.to_string())),
            Backend::Memory(memory) => Ok(memory.list_summaries()),
        }
    }

    // ─── Batch Commit ────────────────────────────────────────────

    /// Commit a pass's staged writes.
    ///
    /// Firestore applies them in transactions of at most `BATCH_SIZE` ops;
    /// a failed chunk aborts the commit with nothing from that chunk applied.
    /// The memory backend applies everything directly (passes are serialized
    /// by the sync engine, so readers never observe a half-applied pass).
    pub async fn commit_batch(&self, ops: &[WriteOp]) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                for chunk in ops.chunks(BATCH_SIZE) {
                    let mut transaction = client.begin_transaction().await.map_err(|e| {
                        AppError::Store(format!("Failed to begin transaction: {}", e))
                    })?;

                    for op in chunk {
                        match op {
                            WriteOp::PutActivity(record) => {
                                let doc_id = record.id.as_deref().ok_or_else(|| {
                                    AppError::BadRequest(
                                        "Cannot persist an activity without an id".to_string(),
                                    )
                                })?;
                                client
                                    .fluent()
                                    .update()
                                    .in_col(collections::ACTIVITIES)
                                    .document_id(doc_id)
                                    .object(record)
                                    .add_to_transaction(&mut transaction)
                                    .map_err(|e| {
                                        AppError::Store(format!(
                                            "Failed to add activity to transaction: {}",
                                            e
                                        ))
                                    })?;
                            }
                            WriteOp::DeleteActivity(id) => {
                                client
                                    .fluent()
                                    .delete()
                                    .from(collections::ACTIVITIES)
                                    .document_id(id)
                                    .add_to_transaction(&mut transaction)
                                    .map_err(|e| {
                                        AppError::Store(format!(
                                            "Failed to add deletion to transaction: {}",
                                            e
                                        ))
                                    })?;
                            }
                            WriteOp::PutSummary(entry) => {
                                let doc_id = urlencoding::encode(&entry.athlete_key).into_owned();
                                client
                                    .fluent()
                                    .update()
                                    .in_col(collections::SUMMARIES)
                                    .document_id(&doc_id)
                                    .object(entry)
                                    .add_to_transaction(&mut transaction)
                                    .map_err(|e| {
                                        AppError::Store(format!(
                                            "Failed to add summary to transaction: {}",
                                            e
                                        ))
                                    })?;
                            }
                            WriteOp::DeleteSummary(athlete_key) => {
                                let doc_id = urlencoding::encode(athlete_key).into_owned();
                                client
                                    .fluent()
                                    .delete()
                                    .from(collections::SUMMARIES)
                                    .document_id(&doc_id)
                                    .add_to_transaction(&mut transaction)
                                    .map_err(|e| {
                                        AppError::Store(format!(
                                            "Failed to add summary deletion to transaction: {}",
                                            e
                                        ))
                                    })?;
                            }
                        }
                    }

                    transaction.commit().await.map_err(|e| {
                        AppError::Store(format!("Transaction commit failed: {}", e))
                    })?;
                }
                Ok(())
            }
            Backend::Memory(memory) => {
                for op in ops {
                    match op {
                        WriteOp::PutActivity(record) => {
                            let doc_id = record.id.as_deref().ok_or_else(|| {
                                AppError::BadRequest(
                                    "Cannot persist an activity without an id".to_string(),
                                )
                            })?;
                            memory.put_activity(doc_id, record.clone());
                        }
                        WriteOp::DeleteActivity(id) => memory.delete_activity(id),
                        WriteOp::PutSummary(entry) => memory.put_summary(entry.clone()),
                        WriteOp::DeleteSummary(athlete_key) => memory.delete_summary(athlete_key),
                    }
                }
                Ok(())
            }
        }
    }
}
