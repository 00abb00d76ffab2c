// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching activity pages.
//!
//! Handles:
//! - Paginated athlete activity listing (full payloads, with activity IDs)
//! - Paginated club activity listing (sparse payloads: no activity ID, no
//!   start date, athlete reduced to first/last name)
//! - Rate limit detection
//!
//! OAuth token exchange and refresh happen upstream; callers pass a ready
//! access token. Payloads are returned as raw JSON for the normalizer.

use crate::error::AppError;
use serde_json::Value;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for StravaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StravaClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://www.strava.com/api/v3".to_string(),
        }
    }

    /// Client pointed at a different base URL (tests, mock servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// List the authenticated athlete's activities (paginated).
    ///
    /// These payloads carry the activity `id` and `start_date`, the two
    /// strongest identity signals.
    pub async fn list_athlete_activities(
        &self,
        access_token: &str,
        after: i64, // Unix timestamp
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("after", after.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// List recent club activities (paginated).
    ///
    /// Club payloads are sparse: no activity ID, no start date, and the
    /// athlete reduced to `{firstname, lastname}`. They are the main source
    /// of duplicate risk downstream.
    pub async fn list_club_activities(
        &self,
        access_token: &str,
        club_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{}/clubs/{}/activities", self.base_url, club_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check a response and deserialize its JSON body.
    async fn check_response_json(&self, response: reqwest::Response) -> Result<Vec<Value>, AppError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(900); // Strava windows reset every 15 minutes
            return Err(AppError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Strava returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Invalid Strava response body: {}", e)))
    }
}
