// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pace, time and distance math.
//!
//! All arithmetic is unit-agnostic: the caller is responsible for pairing a
//! distance in miles with a pace per mile (or kilometers with per-kilometer).

pub mod calc;
pub mod codec;

pub use calc::{distance_from_time_pace, pace_from_distance_time, time_from_distance_pace};
pub use codec::{format_pace, format_time, parse_pace, parse_time};

/// Errors raised by the codec and the arithmetic helpers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaceError {
    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Value out of range: {0} seconds (must be >= 0)")]
    Range(i64),

    #[error("Division by zero: {0} must be non-zero")]
    Division(&'static str),
}
