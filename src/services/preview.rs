// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route and preview shaping for Strava activities.

use geo::{BoundingRect, Coord, LineString};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{ActivityDetail, ActivityRoute, ActivitySplit, RouteBounds, StreamSet, Unit};

const FEET_PER_METER: f64 = 3.28084;

/// A split counts as a whole-unit split when within this many meters of one unit.
const SPLIT_TOLERANCE_METERS: f64 = 50.0;

/// Build a map route from the `latlng` stream, falling back to the activity's
/// encoded polyline (Strava format, precision 5) when the stream is empty.
pub fn build_route(streams: &StreamSet, encoded: Option<&str>) -> Result<ActivityRoute, AppError> {
    let line: LineString<f64> = if !streams.latlng().is_empty() {
        streams
            .latlng()
            .iter()
            .map(|[lat, lng]| Coord { x: *lng, y: *lat })
            .collect()
    } else if let Some(encoded) = encoded {
        polyline::decode_polyline(encoded, 5).map_err(|e| AppError::Upstream {
            status: None,
            body: format!("Failed to decode polyline: {}", e),
        })?
    } else {
        LineString::new(Vec::new())
    };

    let bounds = line.bounding_rect().map(|rect| RouteBounds {
        min_lat: rect.min().y,
        min_lng: rect.min().x,
        max_lat: rect.max().y,
        max_lng: rect.max().x,
    });

    Ok(ActivityRoute {
        polyline: line.coords().map(|c| [c.y, c.x]).collect(),
        bounds,
    })
}

/// Normalized activity preview.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityPreview {
    pub summary: PreviewSummary,
    /// `[lat, lng]` pairs
    pub polyline: Vec<[f64; 2]>,
    pub series: PreviewSeries,
    pub splits: Vec<PreviewSplit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewSummary {
    pub unit: Unit,
    pub distance: f64,
    pub duration_s: Option<i64>,
    /// Seconds per unit
    pub avg_pace_s: Option<f64>,
    pub avg_hr: Option<f64>,
    pub elev_gain_ft: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewSeries {
    pub t_s: Vec<i64>,
    /// Seconds per unit; `None` while stopped
    pub pace_s: Vec<Option<f64>>,
    pub hr_bpm: Vec<f64>,
    pub elev_ft: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewSplit {
    /// 1-indexed position among whole-unit splits
    pub index: usize,
    pub time_s: Option<i64>,
    pub pace_s: Option<f64>,
    pub avg_hr: Option<f64>,
}

fn pace_from_speed(unit: Unit, meters_per_second: f64) -> Option<f64> {
    (meters_per_second > 0.0).then(|| unit.meters() / meters_per_second)
}

/// Combine activity detail and streams into a preview in `unit`.
pub fn build_preview(detail: &ActivityDetail, streams: &StreamSet, unit: Unit) -> ActivityPreview {
    let distance = unit.from_meters(detail.distance.unwrap_or(0.0));
    let duration_s = detail.moving_time;
    let avg_pace_s = match duration_s {
        Some(secs) if secs > 0 && distance > 0.0 => Some(secs as f64 / distance),
        _ => None,
    };

    let summary = PreviewSummary {
        unit,
        distance,
        duration_s,
        avg_pace_s,
        avg_hr: detail.average_heartrate,
        elev_gain_ft: detail.total_elevation_gain.unwrap_or(0.0) * FEET_PER_METER,
    };

    let series = PreviewSeries {
        t_s: streams.time().to_vec(),
        pace_s: streams
            .velocity()
            .iter()
            .map(|v| pace_from_speed(unit, *v))
            .collect(),
        hr_bpm: streams.heartrate().to_vec(),
        elev_ft: streams
            .altitude()
            .iter()
            .map(|m| m * FEET_PER_METER)
            .collect(),
    };

    let source: &[ActivitySplit] = match unit {
        Unit::Mile => &detail.splits_standard,
        Unit::Kilometer => &detail.splits_metric,
    };
    let splits = source
        .iter()
        .filter(|s| (s.distance - unit.meters()).abs() < SPLIT_TOLERANCE_METERS)
        .enumerate()
        .map(|(i, s)| PreviewSplit {
            index: i + 1,
            time_s: s.moving_time.or(s.elapsed_time),
            pace_s: s.average_speed.and_then(|v| pace_from_speed(unit, v)),
            avg_hr: s.average_heartrate,
        })
        .collect();

    ActivityPreview {
        summary,
        polyline: streams.latlng().to_vec(),
        series,
        splits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams(value: serde_json::Value) -> StreamSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_route_from_latlng_stream() {
        let s = streams(serde_json::json!({
            "latlng": { "data": [[37.40, -122.10], [37.42, -122.12], [37.41, -122.08]] }
        }));
        let route = build_route(&s, Some("ignored")).unwrap();
        assert_eq!(route.polyline.len(), 3);
        assert_eq!(route.polyline[0], [37.40, -122.10]);
        assert_eq!(
            route.bounds,
            Some(RouteBounds {
                min_lat: 37.40,
                min_lng: -122.12,
                max_lat: 37.42,
                max_lng: -122.08,
            })
        );
    }

    #[test]
    fn test_route_falls_back_to_encoded_polyline() {
        // Reference example from the encoded polyline format documentation
        let route = build_route(&StreamSet::default(), Some("_p~iF~ps|U_ulLnnqC_mqNvxq`@")).unwrap();
        assert_eq!(route.polyline.len(), 3);
        let first = route.polyline[0];
        assert!((first[0] - 38.5).abs() < 1e-9);
        assert!((first[1] - -120.2).abs() < 1e-9);
        let bounds = route.bounds.unwrap();
        assert!((bounds.max_lat - 43.252).abs() < 1e-9);
        assert!((bounds.min_lng - -126.453).abs() < 1e-9);
    }

    #[test]
    fn test_route_empty() {
        let route = build_route(&StreamSet::default(), None).unwrap();
        assert!(route.polyline.is_empty());
        assert_eq!(route.bounds, None);
    }

    #[test]
    fn test_preview_series_and_splits() {
        let detail: ActivityDetail = serde_json::from_value(serde_json::json!({
            "id": 1,
            "distance": 3218.688,
            "moving_time": 960,
            "total_elevation_gain": 10.0,
            "average_heartrate": 150.0,
            "splits_standard": [
                { "distance": 1609.0, "moving_time": 480, "average_speed": 3.352800, "average_heartrate": 148.0 },
                { "distance": 1609.7, "elapsed_time": 490, "average_speed": 0.0 },
                { "distance": 120.0, "moving_time": 30 }
            ]
        }))
        .unwrap();
        let s = streams(serde_json::json!({
            "time": { "data": [0, 1, 2] },
            "velocity_smooth": { "data": [0.0, 3.3528, 4.4704] },
            "altitude": { "data": [10.0, 11.0] }
        }));

        let preview = build_preview(&detail, &s, Unit::Mile);
        assert!((preview.summary.distance - 2.0).abs() < 1e-9);
        assert!((preview.summary.avg_pace_s.unwrap() - 480.0).abs() < 1e-9);
        assert!((preview.summary.elev_gain_ft - 32.8084).abs() < 1e-9);

        assert_eq!(preview.series.t_s, vec![0, 1, 2]);
        assert_eq!(preview.series.pace_s[0], None);
        assert!((preview.series.pace_s[1].unwrap() - 480.0).abs() < 1e-6);
        assert!((preview.series.pace_s[2].unwrap() - 360.0).abs() < 1e-6);
        assert!(preview.series.hr_bpm.is_empty());
        assert_eq!(preview.series.elev_ft.len(), 2);

        assert_eq!(preview.splits.len(), 2);
        assert_eq!(preview.splits[0].index, 1);
        assert!((preview.splits[0].pace_s.unwrap() - 480.0).abs() < 1e-3);
        assert_eq!(preview.splits[1].time_s, Some(490));
        assert_eq!(preview.splits[1].pace_s, None);

        // Metric splits are absent, so a km preview has none
        assert!(build_preview(&detail, &s, Unit::Kilometer).splits.is_empty());
    }
}
