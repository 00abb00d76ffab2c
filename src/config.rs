//! Application configuration loaded from environment variables.
//!
//! The sync runner is invoked on an external schedule (Cloud Scheduler in
//! production), so configuration is read once at startup.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava API access token (OAuth exchange/refresh happens upstream)
    pub strava_access_token: String,
    /// Strava club whose activity feed is ingested, if any
    pub strava_club_id: Option<u64>,
    /// Page size for paginated Strava fetches
    pub fetch_page_size: u32,
    /// Distance rounding unit (meters) for duplicate-group cleanup
    pub cleanup_distance_unit_m: f64,
    /// Whether the runner applies cleanup deletions or only reports them
    pub cleanup_apply: bool,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            strava_access_token: "test_access_token".to_string(),
            strava_club_id: None,
            fetch_page_size: 50,
            cleanup_distance_unit_m: 1.0,
            cleanup_apply: false,
            gcp_project_id: "test-project".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            strava_access_token: env::var("STRAVA_ACCESS_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_ACCESS_TOKEN"))?,
            strava_club_id: match env::var("STRAVA_CLUB_ID") {
                Ok(raw) => Some(
                    raw.parse()
                        .map_err(|_| ConfigError::Invalid("STRAVA_CLUB_ID"))?,
                ),
                Err(_) => None,
            },
            fetch_page_size: env::var("FETCH_PAGE_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            cleanup_distance_unit_m: env::var("CLEANUP_DISTANCE_UNIT_M")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("CLEANUP_DISTANCE_UNIT_M"))?,
            cleanup_apply: env::var("CLEANUP_APPLY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
