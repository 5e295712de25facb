// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for OAuth and activity reads.
//!
//! Handles:
//! - Authorization code exchange and token refresh
//! - Activity listing, detail and stream fetching
//! - Rate limit detection (logged, surfaced as an upstream error)

use crate::config::Config;
use crate::error::AppError;
use crate::models::{ActivityDetail, ActivitySummary, AthleteProfile, StreamSet};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a client from configuration. Every request is bounded by
    /// `config.upstream_timeout`.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.strava_api_url.trim_end_matches('/').to_string(),
            oauth_url: config.strava_oauth_url.trim_end_matches('/').to_string(),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
        })
    }

    /// Browser-facing authorization URL.
    pub fn authorize_url(&self, callback_url: &str, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}&approval_prompt=auto&state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(callback_url),
            urlencoding::encode("read,activity:read"),
            urlencoding::encode(state),
        )
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<ActivityDetail, AppError> {
        let url = format!("{}/activities/{}", self.api_url, activity_id);
        self.get_json(&url, access_token, &[("include_all_efforts", "false".to_string())])
            .await
    }

    /// Get streams for an activity, keyed by type.
    pub async fn get_activity_streams(
        &self,
        access_token: &str,
        activity_id: u64,
        keys: &[&str],
    ) -> Result<StreamSet, AppError> {
        let url = format!("{}/activities/{}/streams", self.api_url, activity_id);
        self.get_json(
            &url,
            access_token,
            &[
                ("keys", keys.join(",")),
                ("key_by_type", "true".to_string()),
            ],
        )
        .await
    }

    /// One page of the athlete's activities, unfiltered.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
        after: Option<i64>, // Unix timestamp
    ) -> Result<Vec<ActivitySummary>, AppError> {
        let url = format!("{}/athlete/activities", self.api_url);
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }
        self.get_json(&url, access_token, &query).await
    }

    /// Get authenticated athlete profile (raw JSON).
    pub async fn get_athlete(&self, access_token: &str) -> Result<serde_json::Value, AppError> {
        let url = format!("{}/athlete", self.api_url);
        self.get_json(&url, access_token, &[]).await
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        self.post_token(&[("code", code), ("grant_type", "authorization_code")])
            .await
    }

    /// Refresh an expiring access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        self.post_token(&[
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    async fn post_token<T: for<'de> Deserialize<'de>>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        form.extend_from_slice(params);

        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&form)
            .send()
            .await
            .map_err(AppError::transport)?;

        self.check_response_json(response).await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(AppError::transport)?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
            }

            return Err(AppError::Upstream {
                status: Some(status.as_u16()),
                body,
            });
        }

        response.json().await.map_err(|e| AppError::Upstream {
            status: Some(status.as_u16()),
            body: format!("JSON parse error: {}", e),
        })
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    /// Strava may rotate the refresh token; keep the old one when absent.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub athlete: AthleteProfile,
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - High-level service with token management
// ─────────────────────────────────────────────────────────────────────────────

use crate::models::TokenRecord;
use crate::services::TokenStore;

/// Refresh when the access token has this many seconds or fewer left.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Which slice of the activity listing to read.
#[derive(Debug, Clone)]
pub struct ActivityQuery {
    /// 1-indexed
    pub page: u32,
    pub per_page: u32,
    /// Lower bound on start time
    pub after: Option<DateTime<Utc>>,
    /// Case-insensitive exact match on activity type
    pub activity_type: Option<String>,
}

impl ActivityQuery {
    /// Client-side filter applied on top of the upstream listing.
    pub fn matches(&self, activity: &ActivitySummary) -> bool {
        if let Some(ty) = &self.activity_type {
            if !activity.is_type(ty) {
                return false;
            }
        }
        match (self.after, activity.start_date.as_deref()) {
            (Some(after), Some(start)) => DateTime::parse_from_rfc3339(start)
                .map(|dt| dt.with_timezone(&Utc) >= after)
                .unwrap_or(true),
            _ => true,
        }
    }
}

/// High-level Strava service that manages token lifecycle and API calls.
///
/// This service encapsulates:
/// - Athlete resolution (explicit ID, or the sole athlete in dev mode)
/// - Automatic token refresh inside the expiry buffer
/// - Per-athlete locking to prevent duplicate refresh calls
/// - All Strava API calls
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    tokens: TokenStore,
    dev_auto_athlete: bool,
}

impl StravaService {
    pub fn new(client: StravaClient, tokens: TokenStore, dev_auto_athlete: bool) -> Self {
        Self {
            client,
            tokens,
            dev_auto_athlete,
        }
    }

    pub fn client(&self) -> &StravaClient {
        &self.client
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Decide which athlete a request is for.
    ///
    /// An explicit ID always wins. Without one, the sole connected athlete is
    /// used only when dev auto-resolution is enabled.
    pub fn resolve_athlete(&self, athlete_id: Option<u64>) -> Result<u64, AppError> {
        if let Some(id) = athlete_id {
            return Ok(id);
        }
        if self.dev_auto_athlete {
            if let Some(id) = self.tokens.sole_athlete() {
                tracing::debug!(athlete_id = id, "Auto-resolved sole connected athlete");
                return Ok(id);
            }
        }
        Err(AppError::BadRequest("athlete_id is required".to_string()))
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid access token for the given athlete.
    ///
    /// 1. Return the cached token if it has more than the buffer left
    /// 2. Otherwise take the athlete's refresh lock
    /// 3. Re-check (another task may have refreshed while we waited)
    /// 4. Refresh with Strava and store the new record
    pub async fn get_token(&self, athlete_id: u64) -> Result<String, AppError> {
        let record = self.record(athlete_id)?;
        if record.is_fresh(Utc::now(), TOKEN_EXPIRY_BUFFER_SECS) {
            return Ok(record.access_token);
        }

        let lock = self.tokens.refresh_lock(athlete_id);
        let _guard = lock.lock().await;

        let record = self.record(athlete_id)?;
        if record.is_fresh(Utc::now(), TOKEN_EXPIRY_BUFFER_SECS) {
            return Ok(record.access_token);
        }

        tracing::info!(athlete_id, "Access token expiring, refreshing");

        let refreshed = self.client.refresh_token(&record.refresh_token).await?;

        let expires_at = DateTime::from_timestamp(refreshed.expires_at, 0).ok_or_else(|| {
            AppError::Upstream {
                status: None,
                body: format!("Invalid expires_at in refresh response: {}", refreshed.expires_at),
            }
        })?;

        let updated = TokenRecord {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token.unwrap_or(record.refresh_token),
            expires_at,
            ..record
        };
        let access_token = updated.access_token.clone();
        self.tokens.insert(updated);

        tracing::info!(athlete_id, %expires_at, "Token refreshed");
        Ok(access_token)
    }

    fn record(&self, athlete_id: u64) -> Result<TokenRecord, AppError> {
        self.tokens.get(athlete_id).ok_or_else(|| {
            AppError::Unauthorized(format!("No Strava token on file for athlete {athlete_id}"))
        })
    }

    // ─── OAuth Callback Handling ─────────────────────────────────────────────

    /// Exchange the authorization code and store the resulting token record.
    pub async fn handle_oauth_callback(&self, code: &str) -> Result<TokenRecord, AppError> {
        let response = self.client.exchange_code(code).await?;

        if response.athlete.id == 0 || response.access_token.is_empty() {
            return Err(AppError::Upstream {
                status: None,
                body: "Incomplete token response from Strava".to_string(),
            });
        }

        let expires_at = DateTime::from_timestamp(response.expires_at, 0).ok_or_else(|| {
            AppError::Upstream {
                status: None,
                body: format!("Invalid expires_at in token response: {}", response.expires_at),
            }
        })?;

        let record = TokenRecord {
            athlete_id: response.athlete.id,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            athlete: response.athlete,
        };
        self.tokens.insert(record.clone());

        tracing::info!(
            athlete_id = record.athlete_id,
            firstname = ?record.athlete.firstname,
            "OAuth callback handled, tokens stored"
        );

        Ok(record)
    }

    // ─── API Wrappers ────────────────────────────────────────────────────────

    /// One raw page of the listing (no client-side filtering).
    pub async fn list_activities_page(
        &self,
        athlete_id: u64,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivitySummary>, AppError> {
        let access_token = self.get_token(athlete_id).await?;
        self.client
            .list_activities(
                &access_token,
                query.page,
                query.per_page,
                query.after.map(|dt| dt.timestamp()),
            )
            .await
    }

    /// One page of the listing with the type and start-date filters applied.
    pub async fn list_activities(
        &self,
        athlete_id: u64,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivitySummary>, AppError> {
        let mut items = self.list_activities_page(athlete_id, query).await?;
        items.retain(|a| query.matches(a));
        Ok(items)
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity_detail(
        &self,
        athlete_id: u64,
        activity_id: u64,
    ) -> Result<ActivityDetail, AppError> {
        let access_token = self.get_token(athlete_id).await?;
        self.client.get_activity(&access_token, activity_id).await
    }

    /// Get activity streams for the requested keys.
    pub async fn get_activity_streams(
        &self,
        athlete_id: u64,
        activity_id: u64,
        keys: &[&str],
    ) -> Result<StreamSet, AppError> {
        let access_token = self.get_token(athlete_id).await?;
        self.client
            .get_activity_streams(&access_token, activity_id, keys)
            .await
    }

    /// Authenticated athlete profile.
    pub async fn get_athlete(&self, athlete_id: u64) -> Result<serde_json::Value, AppError> {
        let access_token = self.get_token(athlete_id).await?;
        self.client.get_athlete(&access_token).await
    }
}
