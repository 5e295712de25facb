// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token record kept per connected athlete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh token pair plus the athlete snippet returned by the
/// token exchange. Keyed by Strava athlete ID in the token store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub athlete_id: u64,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub athlete: AthleteProfile,
}

impl TokenRecord {
    /// True when the access token is still valid for more than `buffer_secs`.
    pub fn is_fresh(&self, now: DateTime<Utc>, buffer_secs: i64) -> bool {
        (self.expires_at - now).num_seconds() > buffer_secs
    }
}

/// Athlete info from the OAuth token exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub id: u64,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}
