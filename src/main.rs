// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club-Leaderboard sync runner
//!
//! Fetches recent activities from Strava, merges them into the stored record
//! set without duplicating re-observed activities, and rebuilds the
//! leaderboard snapshot. Invoked on an external schedule (Cloud Scheduler in
//! production).

use club_leaderboard::{
    config::Config,
    db::RecordStore,
    error::AppError,
    services::{StravaClient, SyncEngine},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(club_id = ?config.strava_club_id, "Starting sync pass");

    // Initialize Firestore-backed record store
    let store = RecordStore::connect(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let engine = SyncEngine::new(store);
    let strava = StravaClient::new();

    // Ingest club activity pages until a short page signals the end.
    if let Some(club_id) = config.strava_club_id {
        let mut page = 1u32;
        loop {
            let raws = match strava
                .list_club_activities(
                    &config.strava_access_token,
                    club_id,
                    page,
                    config.fetch_page_size,
                )
                .await
            {
                Ok(raws) => raws,
                Err(AppError::RateLimited { retry_after_secs }) => {
                    tracing::warn!(retry_after_secs, "Rate limited; stopping fetch early");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let done = (raws.len() as u32) < config.fetch_page_size;
            if !raws.is_empty() {
                let summary = engine.ingest_batch(&raws, "strava_api").await?;
                tracing::info!(
                    page,
                    created = summary.created,
                    updated = summary.updated,
                    "Club page ingested"
                );
            }
            if done {
                break;
            }
            page += 1;
        }
    }

    // Rebuild the leaderboard snapshot from the deduplicated record set.
    let board = engine.rebuild_snapshot(None).await?;
    for entry in &board {
        tracing::info!(
            athlete = %entry.athlete_display,
            distance_m = entry.summary.distance,
            activities = entry.summary.count,
            "Leaderboard entry"
        );
    }

    // Offline duplicate-group cleanup, when configured.
    let plan = engine
        .plan_cleanup_pass(config.cleanup_distance_unit_m)
        .await?;
    if !plan.is_empty() {
        tracing::warn!(groups = plan.len(), "Duplicate groups detected");
        if config.cleanup_apply {
            let deleted = engine.apply_cleanup(&plan).await?;
            tracing::info!(deleted, "Duplicate records removed");
            engine.rebuild_snapshot(None).await?;
        }
    }

    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("club_leaderboard=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
