// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parsing and formatting of `HH:MM:SS` / `MM:SS` durations and `MM:SS` paces.

use super::PaceError;

/// Parse `HH:MM:SS` or `MM:SS` into total seconds.
///
/// In the three-segment form minutes and seconds must be below 60. In the
/// two-segment form minutes are unbounded and only seconds are range checked.
pub fn parse_time(s: &str) -> Result<i64, PaceError> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [mm, ss] => {
            let (mm, ss) = (segment(mm, s)?, segment(ss, s)?);
            if ss >= 60 {
                return Err(PaceError::Format(format!("invalid MM:SS values in '{s}'")));
            }
            combine(0, mm, ss, s)
        }
        [hh, mm, ss] => {
            let (hh, mm, ss) = (segment(hh, s)?, segment(mm, s)?, segment(ss, s)?);
            if mm >= 60 || ss >= 60 {
                return Err(PaceError::Format(format!("invalid HH:MM:SS values in '{s}'")));
            }
            combine(hh, mm, ss, s)
        }
        _ => Err(PaceError::Format(format!(
            "expected MM:SS or HH:MM:SS, got '{s}'"
        ))),
    }
}

/// Format total seconds as zero-padded `HH:MM:SS`. Hours may exceed two digits.
pub fn format_time(seconds: i64) -> Result<String, PaceError> {
    if seconds < 0 {
        return Err(PaceError::Range(seconds));
    }
    let hh = seconds / 3600;
    let mm = (seconds % 3600) / 60;
    let ss = seconds % 60;
    Ok(format!("{hh:02}:{mm:02}:{ss:02}"))
}

/// Parse an `MM:SS` pace into seconds per unit. Minutes may exceed 59.
pub fn parse_pace(s: &str) -> Result<i64, PaceError> {
    let parts: Vec<&str> = s.split(':').collect();
    let [mm, ss] = parts.as_slice() else {
        return Err(PaceError::Format(format!("expected MM:SS pace, got '{s}'")));
    };
    let (mm, ss) = (segment(mm, s)?, segment(ss, s)?);
    if ss >= 60 {
        return Err(PaceError::Format(format!("invalid pace seconds in '{s}'")));
    }
    combine(0, mm, ss, s)
}

/// Format seconds per unit as zero-padded `MM:SS`.
pub fn format_pace(seconds_per_unit: i64) -> Result<String, PaceError> {
    if seconds_per_unit < 0 {
        return Err(PaceError::Range(seconds_per_unit));
    }
    Ok(format!(
        "{:02}:{:02}",
        seconds_per_unit / 60,
        seconds_per_unit % 60
    ))
}

/// A single numeric segment: ASCII digits only, no sign, no whitespace.
fn segment(part: &str, whole: &str) -> Result<i64, PaceError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PaceError::Format(format!(
            "non-numeric segment '{part}' in '{whole}'"
        )));
    }
    part.parse::<i64>()
        .map_err(|_| PaceError::Format(format!("segment '{part}' too large in '{whole}'")))
}

fn combine(hh: i64, mm: i64, ss: i64, whole: &str) -> Result<i64, PaceError> {
    hh.checked_mul(3600)
        .and_then(|h| mm.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(ss))
        .ok_or_else(|| PaceError::Format(format!("duration '{whole}' overflows")))
}
