// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run CRUD routes and single-activity import.

use crate::error::{AppError, Result};
use crate::models::{ImportOverrides, Run, RunPayload, RunType, Unit};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/runs", get(list_runs).post(create_run))
        .route("/runs/from-strava", post(import_from_strava))
        .route(
            "/runs/{id}",
            get(get_run).put(update_run).delete(delete_run),
        )
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Run {} not found", id))
}

/// All runs, newest first.
async fn list_runs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Run>>> {
    Ok(Json(state.db.list().await?))
}

async fn create_run(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunPayload>,
) -> Result<(StatusCode, Json<Run>)> {
    let run = state.db.create(payload).await?;
    tracing::info!(run_id = run.id, "Run created");
    Ok((StatusCode::CREATED, Json(run)))
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Run>> {
    state.db.get(id).await?.map(Json).ok_or_else(|| not_found(id))
}

/// Full replace. Never creates a missing run.
async fn update_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RunPayload>,
) -> Result<Json<Run>> {
    let run = state
        .db
        .update(id, payload)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(run_id = id, "Run updated");
    Ok(Json(run))
}

async fn delete_run(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Result<StatusCode> {
    if !state.db.delete(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(run_id = id, "Run deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Body for importing one Strava activity.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub activity_id: u64,
    #[serde(default)]
    pub athlete_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub run_type: Option<RunType>,
}

async fn import_from_strava(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> Result<(StatusCode, Json<Run>)> {
    let overrides = ImportOverrides {
        title: req.title,
        unit: req.unit,
        run_type: req.run_type,
    };
    let run = state
        .importer
        .import_activity(req.athlete_id, req.activity_id, &overrides)
        .await?;
    Ok((StatusCode::CREATED, Json(run)))
}
