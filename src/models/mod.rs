// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod run;
pub mod sync;
pub mod token;

pub use activity::{
    ActivityDetail, ActivityMap, ActivityRoute, ActivitySplit, ActivitySummary, RouteBounds,
    StreamSet, PREVIEW_STREAM_KEYS,
};
pub use run::{Run, RunPayload, RunType, Unit};
pub use sync::{ImportOverrides, SyncCounts, SyncError, SyncOptions, SyncReport};
pub use token::{AthleteProfile, TokenRecord};
