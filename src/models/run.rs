// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run record model for storage and API.

use crate::error::AppError;
use crate::pace::{format_pace, pace_from_distance_time};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const METERS_PER_MILE: f64 = 1609.344;
const METERS_PER_KILOMETER: f64 = 1000.0;

/// Distance unit. Pace is always expressed per one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Unit {
    #[default]
    #[serde(rename = "mi", alias = "mile", alias = "miles")]
    Mile,
    #[serde(rename = "km", alias = "kilometer", alias = "kilometers")]
    Kilometer,
}

impl Unit {
    /// Length of one unit in meters.
    pub const fn meters(self) -> f64 {
        match self {
            Unit::Mile => METERS_PER_MILE,
            Unit::Kilometer => METERS_PER_KILOMETER,
        }
    }

    /// Convert a distance in meters into this unit.
    pub fn from_meters(self, meters: f64) -> f64 {
        meters / self.meters()
    }

    /// Convert a distance expressed in `from` into this unit.
    pub fn convert_from(self, distance: f64, from: Unit) -> f64 {
        if from == self {
            distance
        } else {
            distance * from.meters() / self.meters()
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Unit::Mile => "mi",
            Unit::Kilometer => "km",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mi" | "mile" | "miles" => Ok(Unit::Mile),
            "km" | "kilometer" | "kilometers" => Ok(Unit::Kilometer),
            other => Err(AppError::BadRequest(format!("Unknown unit '{other}'"))),
        }
    }
}

/// High-level categorization of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RunType {
    #[default]
    #[serde(rename = "easy", alias = "Easy Run")]
    Easy,
    #[serde(rename = "workout", alias = "Workout")]
    Workout,
    #[serde(rename = "long", alias = "Long Run")]
    Long,
    #[serde(rename = "race", alias = "Race")]
    Race,
}

impl RunType {
    pub const fn as_str(self) -> &'static str {
        match self {
            RunType::Easy => "easy",
            RunType::Workout => "workout",
            RunType::Long => "long",
            RunType::Race => "race",
        }
    }
}

impl FromStr for RunType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" | "Easy Run" => Ok(RunType::Easy),
            "workout" | "Workout" => Ok(RunType::Workout),
            "long" | "Long Run" => Ok(RunType::Long),
            "race" | "Race" => Ok(RunType::Race),
            other => Err(AppError::BadRequest(format!("Unknown run type '{other}'"))),
        }
    }
}

/// Payload for creating or fully replacing a run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunPayload {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Start instant; the offset is kept so the local calendar day survives.
    pub started_at: DateTime<FixedOffset>,
    /// Distance in `unit`
    #[validate(range(exclusive_min = 0.0))]
    pub distance: f64,
    #[serde(default)]
    pub unit: Unit,
    /// Whole seconds
    #[validate(range(min = 1))]
    pub duration_s: i64,
    #[serde(default)]
    pub run_type: RunType,
    #[serde(default)]
    pub elevation_ft: Option<f64>,
    /// Source system name (e.g. "strava")
    #[serde(default)]
    pub source: Option<String>,
    /// Identifier in the source system
    #[serde(default)]
    pub source_ref: Option<String>,
    /// Seconds per unit; derived when absent
    #[serde(default)]
    pub pace_s: Option<i64>,
    /// `MM:SS` per unit; always re-derived from `pace_s`
    #[serde(default)]
    pub pace: Option<String>,
}

impl RunPayload {
    /// Validate the payload and fill in the derived pace fields.
    ///
    /// A caller-supplied `pace_s` must agree with `round(duration_s / distance)`.
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.validate()?;

        let pace_s = pace_from_distance_time(self.distance, self.duration_s)?;
        if let Some(supplied) = self.pace_s {
            if supplied != pace_s {
                return Err(AppError::BadRequest(format!(
                    "pace_s {supplied} does not match distance/duration (expected {pace_s})"
                )));
            }
        }

        self.pace = Some(format_pace(pace_s)?);
        self.pace_s = Some(pace_s);
        Ok(self)
    }
}

/// Stored run with a server-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Run {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub started_at: DateTime<FixedOffset>,
    pub distance: f64,
    pub unit: Unit,
    pub duration_s: i64,
    pub run_type: RunType,
    pub elevation_ft: Option<f64>,
    pub source: Option<String>,
    pub source_ref: Option<String>,
    pub pace_s: Option<i64>,
    pub pace: Option<String>,
}
