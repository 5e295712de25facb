// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derive the third of {distance, time, pace} from the other two.
//!
//! Rounding is half away from zero (`f64::round`). Distance, time and pace
//! cannot all be integers at once, so a round trip through these helpers can
//! drift by a second or so.

use super::PaceError;

/// Pace in seconds per unit: `round(seconds / distance)`.
pub fn pace_from_distance_time(distance: f64, seconds: i64) -> Result<i64, PaceError> {
    if distance == 0.0 {
        return Err(PaceError::Division("distance"));
    }
    Ok((seconds as f64 / distance).round() as i64)
}

/// Total time in seconds: `round(distance * pace)`.
pub fn time_from_distance_pace(distance: f64, pace_seconds_per_unit: i64) -> i64 {
    (distance * pace_seconds_per_unit as f64).round() as i64
}

/// Distance covered, unrounded. Callers round for display.
pub fn distance_from_time_pace(seconds: i64, pace_seconds_per_unit: i64) -> Result<f64, PaceError> {
    if pace_seconds_per_unit == 0 {
        return Err(PaceError::Division("pace"));
    }
    Ok(seconds as f64 / pace_seconds_per_unit as f64)
}
