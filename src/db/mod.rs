// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite).

pub mod runs;

pub use runs::RunStore;

/// Table names as constants.
pub mod tables {
    pub const RUNS: &str = "runs";
}
