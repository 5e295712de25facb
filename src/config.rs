// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Strava OAuth ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Key used to sign the OAuth `state` parameter (raw bytes)
    pub oauth_state_key: Vec<u8>,

    // --- Server ---
    /// SQLite URL for the run store
    pub database_url: String,
    /// Server port
    pub port: u16,
    /// Public base URL used to build the OAuth callback. Derived from the
    /// request `Host` header when unset.
    pub base_url: Option<String>,
    /// Where the OAuth callback redirects the browser after connecting
    pub connected_redirect: String,

    // --- Upstream ---
    /// Strava REST API base
    pub strava_api_url: String,
    /// Strava OAuth base (`/authorize`, `/token`)
    pub strava_oauth_url: String,
    /// Timeout applied to every upstream request
    pub upstream_timeout: Duration,

    // --- Sync ---
    /// Resolve a missing athlete ID to the sole connected athlete.
    /// Development convenience; off unless explicitly enabled.
    pub dev_auto_athlete: bool,
    /// Listing page size used by bulk sync
    pub sync_page_size: u32,
    /// Fingerprint distance bucket width, in units
    pub dedup_distance_bucket: f64,
    /// Fingerprint duration bucket width, in seconds
    pub dedup_duration_bucket_secs: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            strava_client_id: required("STRAVA_CLIENT_ID")?,
            strava_client_secret: required("STRAVA_CLIENT_SECRET")?,
            oauth_state_key: required("OAUTH_STATE_KEY")?.into_bytes(),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:runlog.db".to_string()),
            port: parsed("PORT", 8080)?,
            base_url: env::var("BASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            connected_redirect: env::var("CONNECTED_REDIRECT")
                .unwrap_or_else(|_| "/?strava=connected".to_string()),

            strava_api_url: env::var("STRAVA_API_URL")
                .unwrap_or_else(|_| "https://www.strava.com/api/v3".to_string()),
            strava_oauth_url: env::var("STRAVA_OAUTH_URL")
                .unwrap_or_else(|_| "https://www.strava.com/oauth".to_string()),
            upstream_timeout: Duration::from_secs(parsed("UPSTREAM_TIMEOUT_SECS", 20)?),

            dev_auto_athlete: parsed("DEV_AUTO_ATHLETE", false)?,
            sync_page_size: parsed("SYNC_PAGE_SIZE", 50)?,
            dedup_distance_bucket: parsed("DEDUP_DISTANCE_BUCKET", 0.02)?,
            dedup_duration_bucket_secs: parsed("DEDUP_DURATION_BUCKET_SECS", 10)?,
        })
    }

    /// Fully-populated configuration for tests.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            base_url: None,
            connected_redirect: "/?strava=connected".to_string(),
            strava_api_url: "http://127.0.0.1:9/api/v3".to_string(),
            strava_oauth_url: "http://127.0.0.1:9/oauth".to_string(),
            upstream_timeout: Duration::from_secs(5),
            dev_auto_athlete: false,
            sync_page_size: 50,
            dedup_distance_bucket: 0.02,
            dedup_duration_bucket_secs: 10,
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
