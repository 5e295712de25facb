// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only projections of Strava activity resources.
//!
//! These are consumed once (mapped into a [`Run`](super::Run) or a preview)
//! and never stored.

use serde::{Deserialize, Serialize};

/// Summary activity from the athlete activity listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default)]
    pub sport_type: Option<String>,
    /// UTC start (RFC 3339)
    #[serde(default)]
    pub start_date: Option<String>,
    /// Local wall-clock start, tagged `Z` by Strava
    #[serde(default)]
    pub start_date_local: Option<String>,
    /// Meters
    #[serde(default)]
    pub distance: f64,
    /// Seconds
    #[serde(default)]
    pub moving_time: i64,
    /// Meters
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
}

impl ActivitySummary {
    /// Case-insensitive exact match on the activity type.
    pub fn is_type(&self, activity_type: &str) -> bool {
        self.activity_type.eq_ignore_ascii_case(activity_type)
    }

    /// Local start when present, otherwise the UTC start.
    pub fn start(&self) -> Option<&str> {
        self.start_date_local
            .as_deref()
            .or(self.start_date.as_deref())
    }
}

/// Detailed activity response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDetail {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub start_date_local: Option<String>,
    /// Meters
    #[serde(default)]
    pub distance: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub moving_time: Option<i64>,
    /// Meters
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub map: Option<ActivityMap>,
    /// Per-mile splits
    #[serde(default)]
    pub splits_standard: Vec<ActivitySplit>,
    /// Per-kilometer splits
    #[serde(default)]
    pub splits_metric: Vec<ActivitySplit>,
}

impl ActivityDetail {
    /// Get the detailed polyline, falling back to summary if not available.
    pub fn get_polyline(&self) -> Option<&str> {
        let map = self.map.as_ref()?;
        map.polyline
            .as_deref()
            .or(map.summary_polyline.as_deref())
            .filter(|p| !p.is_empty())
    }
}

/// Activity map data with encoded polylines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityMap {
    #[serde(default)]
    pub polyline: Option<String>,
    #[serde(default)]
    pub summary_polyline: Option<String>,
}

/// One split from `splits_standard` / `splits_metric`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySplit {
    /// Meters
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: Option<i64>,
    #[serde(default)]
    pub elapsed_time: Option<i64>,
    /// Meters per second
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
}

/// Stream keys requested for previews.
pub const PREVIEW_STREAM_KEYS: &[&str] =
    &["latlng", "time", "velocity_smooth", "heartrate", "altitude"];

/// Streams fetched with `key_by_type=true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamSet {
    #[serde(default)]
    pub latlng: Option<Stream<[f64; 2]>>,
    #[serde(default)]
    pub time: Option<Stream<i64>>,
    #[serde(default)]
    pub velocity_smooth: Option<Stream<f64>>,
    #[serde(default)]
    pub heartrate: Option<Stream<f64>>,
    #[serde(default)]
    pub altitude: Option<Stream<f64>>,
}

/// A single stream series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Stream<T> {
    fn slice(stream: &Option<Self>) -> &[T] {
        stream.as_ref().map_or(&[], |s| s.data.as_slice())
    }
}

impl StreamSet {
    pub fn latlng(&self) -> &[[f64; 2]] {
        Stream::slice(&self.latlng)
    }

    pub fn time(&self) -> &[i64] {
        Stream::slice(&self.time)
    }

    pub fn velocity(&self) -> &[f64] {
        Stream::slice(&self.velocity_smooth)
    }

    pub fn heartrate(&self) -> &[f64] {
        Stream::slice(&self.heartrate)
    }

    pub fn altitude(&self) -> &[f64] {
        Stream::slice(&self.altitude)
    }
}

/// GPS route for map rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRoute {
    /// `[lat, lng]` pairs
    pub polyline: Vec<[f64; 2]>,
    pub bounds: Option<RouteBounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}
