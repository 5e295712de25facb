// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth connect flow.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::oauth_state::{STATE_COOKIE, STATE_TTL_SECS};
use crate::AppState;

const CALLBACK_PATH: &str = "/oauth/callback";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/connect", get(connect))
        .route(CALLBACK_PATH, get(callback))
}

/// Public base URL: configured, or derived from the request `Host`.
fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.base_url {
        return base.clone();
    }

    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost:8080");

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };
    format!("{}://{}", scheme, host)
}

/// Start OAuth: set the state cookie and redirect to Strava's authorize page.
async fn connect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let oauth_state = state.oauth_states.issue()?;
    let callback_url = format!("{}{}", base_url(&state, &headers), CALLBACK_PATH);
    let auth_url = state
        .strava
        .client()
        .authorize_url(&callback_url, &oauth_state);

    let cookie = Cookie::build((STATE_COOKIE, oauth_state))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(STATE_TTL_SECS))
        .build();

    tracing::info!(
        client_id = %state.config.strava_client_id,
        callback_url = %callback_url,
        "Starting OAuth flow, redirecting to Strava"
    );

    Ok((jar.add(cookie), Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback: check state, exchange the code, store tokens.
async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return Err(AppError::BadRequest(format!("Strava error: {}", error)));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing code".to_string()))?;
    let oauth_state = params
        .state
        .ok_or_else(|| AppError::BadRequest("Missing OAuth state".to_string()))?;

    state
        .oauth_states
        .consume(&oauth_state, jar.get(STATE_COOKIE).map(|c| c.value()))?;

    tracing::info!("Exchanging authorization code for tokens");
    let record = state.strava.handle_oauth_callback(&code).await?;

    tracing::info!(athlete_id = record.athlete_id, "OAuth successful");

    // Expire the state cookie whether or not this request carried it
    let expired = Cookie::build((STATE_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    Ok((jar.add(expired), Redirect::temporary(&state.config.connected_redirect)))
}
