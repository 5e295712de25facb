// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-backed routes: bulk sync, connection status and activity reads.

use crate::error::{AppError, Result};
use crate::models::{ActivityRoute, SyncOptions, SyncReport, Unit, PREVIEW_STREAM_KEYS};
use crate::services::{build_preview, build_route, ActivityPreview, ActivityQuery};
use crate::time_utils::{format_utc_rfc3339, parse_after};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync", post(sync))
        .route("/strava/status", get(status))
        .route("/strava/me", get(me))
        .route("/strava/activities", get(list_activities))
        .route("/strava/activities/{id}/route", get(activity_route))
        .route("/strava/activities/{id}/preview", get(activity_preview))
}

// ─── Bulk Sync ───────────────────────────────────────────────

const DEFAULT_MAX_IMPORT: u32 = 200;
const MAX_MAX_IMPORT: u32 = 2000;

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    athlete_id: Option<u64>,
    after: Option<String>,
    max_import: Option<u32>,
    #[serde(default)]
    dry_run: bool,
    unit: Option<Unit>,
}

/// Import the athlete's runs that don't match a stored run.
///
/// The sync runs on its own task; if the client disconnects, the handler
/// future is dropped and the guard cancels the loop.
async fn sync(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SyncQuery>,
) -> Result<Json<SyncReport>> {
    let max_import = params.max_import.unwrap_or(DEFAULT_MAX_IMPORT);
    if !(1..=MAX_MAX_IMPORT).contains(&max_import) {
        return Err(AppError::BadRequest(format!(
            "max_import must be between 1 and {}",
            MAX_MAX_IMPORT
        )));
    }

    let options = SyncOptions {
        after: parse_after(params.after.as_deref())?,
        max_import,
        dry_run: params.dry_run,
        unit: params.unit.unwrap_or_default(),
    };

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let importer = state.importer.clone();
    let athlete_id = params.athlete_id;

    let report = tokio::spawn(async move { importer.sync(athlete_id, &options, &cancel).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Sync task failed: {}", e)))??;

    Ok(Json(report))
}

// ─── Connection Status ───────────────────────────────────────

#[derive(Deserialize)]
pub struct AthleteQuery {
    athlete_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub athlete_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub athlete: Option<AthleteName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AthleteName {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

/// Connection status. Never fails: an unknown athlete is reported as
/// disconnected.
async fn status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AthleteQuery>,
) -> Json<StatusResponse> {
    let record = state
        .strava
        .resolve_athlete(params.athlete_id)
        .ok()
        .and_then(|id| state.strava.tokens().get(id));

    Json(match record {
        Some(record) => StatusResponse {
            connected: true,
            athlete_id: Some(record.athlete_id),
            athlete: Some(AthleteName {
                firstname: record.athlete.firstname,
                lastname: record.athlete.lastname,
            }),
            expires_at: Some(format_utc_rfc3339(record.expires_at)),
        },
        None => StatusResponse {
            connected: false,
            athlete_id: None,
            athlete: None,
            expires_at: None,
        },
    })
}

/// Authenticated athlete profile, proxied from Strava.
async fn me(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AthleteQuery>,
) -> Result<Json<serde_json::Value>> {
    let athlete_id = state.strava.resolve_athlete(params.athlete_id)?;
    Ok(Json(state.strava.get_athlete(athlete_id).await?))
}

// ─── Activities ──────────────────────────────────────────────

const MAX_PAGE: u32 = 200;
const MAX_PER_PAGE: u32 = 200;

#[derive(Deserialize)]
pub struct ActivitiesQuery {
    athlete_id: Option<u64>,
    /// 1-indexed
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
    after: Option<String>,
    /// Empty string disables the type filter
    #[serde(default = "default_activity_type")]
    activity_type: String,
    unit: Option<Unit>,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    30
}
fn default_activity_type() -> String {
    "Run".to_string()
}

/// Trimmed listing entry for an activity picker.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityListItem {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date: Option<String>,
    /// Rounded to 2 decimals
    pub distance: f64,
    pub unit: Unit,
    pub moving_time_s: i64,
}

async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<Vec<ActivityListItem>>> {
    if !(1..=MAX_PAGE).contains(&params.page) {
        return Err(AppError::BadRequest(format!(
            "page must be between 1 and {}",
            MAX_PAGE
        )));
    }
    if !(1..=MAX_PER_PAGE).contains(&params.per_page) {
        return Err(AppError::BadRequest(format!(
            "per_page must be between 1 and {}",
            MAX_PER_PAGE
        )));
    }

    let athlete_id = state.strava.resolve_athlete(params.athlete_id)?;
    let unit = params.unit.unwrap_or_default();
    let query = ActivityQuery {
        page: params.page,
        per_page: params.per_page,
        after: parse_after(params.after.as_deref())?,
        activity_type: Some(params.activity_type).filter(|t| !t.trim().is_empty()),
    };

    tracing::debug!(athlete_id, page = query.page, per_page = query.per_page, "Listing activities");

    let items = state.strava.list_activities(athlete_id, &query).await?;
    Ok(Json(
        items
            .into_iter()
            .map(|a| ActivityListItem {
                start_date: a.start().map(str::to_string),
                id: a.id,
                name: a.name,
                activity_type: a.activity_type,
                distance: (unit.from_meters(a.distance) * 100.0).round() / 100.0,
                unit,
                moving_time_s: a.moving_time,
            })
            .collect(),
    ))
}

/// GPS route for map rendering.
async fn activity_route(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<u64>,
    Query(params): Query<AthleteQuery>,
) -> Result<Json<ActivityRoute>> {
    let athlete_id = state.strava.resolve_athlete(params.athlete_id)?;
    let streams = state
        .strava
        .get_activity_streams(athlete_id, activity_id, &["latlng"])
        .await?;

    if !streams.latlng().is_empty() {
        return Ok(Json(build_route(&streams, None)?));
    }

    // No GPS stream; try the encoded polyline on the activity itself
    let detail = state
        .strava
        .get_activity_detail(athlete_id, activity_id)
        .await?;
    Ok(Json(build_route(&streams, detail.get_polyline())?))
}

#[derive(Deserialize)]
pub struct PreviewQuery {
    athlete_id: Option<u64>,
    unit: Option<Unit>,
}

/// Detail and streams combined into a normalized preview.
async fn activity_preview(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<u64>,
    Query(params): Query<PreviewQuery>,
) -> Result<Json<ActivityPreview>> {
    let athlete_id = state.strava.resolve_athlete(params.athlete_id)?;
    let (detail, streams) = tokio::try_join!(
        state.strava.get_activity_detail(athlete_id, activity_id),
        state
            .strava
            .get_activity_streams(athlete_id, activity_id, PREVIEW_STREAM_KEYS),
    )?;
    Ok(Json(build_preview(
        &detail,
        &streams,
        params.unit.unwrap_or_default(),
    )))
}
