// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pace calculator route.

use crate::error::{AppError, Result};
use crate::models::Unit;
use crate::pace::{
    distance_from_time_pace, format_pace, format_time, pace_from_distance_time, parse_pace,
    parse_time, time_from_distance_pace,
};
use crate::AppState;
use axum::{extract::Query, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/pace-calc", get(pace_calc))
}

/// Exactly two of `distance`, `time` (`HH:MM:SS` or `MM:SS`) and `pace`
/// (`MM:SS` per unit).
#[derive(Debug, Deserialize)]
pub struct PaceCalcQuery {
    distance: Option<f64>,
    time: Option<String>,
    pace: Option<String>,
    unit: Option<Unit>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PaceCalcResponse {
    pub unit: Unit,
    /// Rounded to 2 decimals
    pub distance: f64,
    /// `HH:MM:SS`
    pub time: String,
    /// `MM:SS` per unit
    pub pace: String,
    pub time_s: i64,
    pub pace_s: i64,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Complete the distance/time/pace triplet from any two of them.
async fn pace_calc(Query(params): Query<PaceCalcQuery>) -> Result<Json<PaceCalcResponse>> {
    let unit = params.unit.unwrap_or_default();

    if params.distance.is_some_and(|d| !d.is_finite()) {
        return Err(AppError::BadRequest("distance must be a finite number".to_string()));
    }
    let time_s = present(params.time).map(|t| parse_time(&t)).transpose()?;
    let pace_s = present(params.pace).map(|p| parse_pace(&p)).transpose()?;

    let (distance, time_s, pace_s) = match (params.distance, time_s, pace_s) {
        (Some(distance), Some(time_s), None) => {
            (distance, time_s, pace_from_distance_time(distance, time_s)?)
        }
        (Some(distance), None, Some(pace_s)) => {
            (distance, time_from_distance_pace(distance, pace_s), pace_s)
        }
        (None, Some(time_s), Some(pace_s)) => {
            (distance_from_time_pace(time_s, pace_s)?, time_s, pace_s)
        }
        _ => {
            return Err(AppError::BadRequest(
                "Provide exactly two of distance, time, pace".to_string(),
            ))
        }
    };

    Ok(Json(PaceCalcResponse {
        unit,
        distance: (distance * 100.0).round() / 100.0,
        time: format_time(time_s)?,
        pace: format_pace(pace_s)?,
        time_s,
        pace_s,
    }))
}
