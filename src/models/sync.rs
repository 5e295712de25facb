// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bulk sync options and report.

use super::{RunType, Unit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Caller overrides for a single import.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportOverrides {
    pub title: Option<String>,
    pub unit: Option<Unit>,
    pub run_type: Option<RunType>,
}

/// Parameters of one bulk sync invocation.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Only consider activities starting after this instant
    pub after: Option<DateTime<Utc>>,
    /// Budget of new activities to import (or report in dry-run mode)
    pub max_import: u32,
    pub dry_run: bool,
    /// Unit for fingerprints and for imported runs
    pub unit: Unit,
}

/// Per-activity failure collected during a sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncError {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub activity_id: u64,
    /// Upstream HTTP status, absent for transport errors and local failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncCounts {
    pub imported: usize,
    pub already: usize,
    pub would_import: usize,
    pub errors: usize,
}

/// Outcome of a bulk sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncReport {
    pub summary: SyncCounts,
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub imported_ids: Vec<u64>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub already_ids: Vec<u64>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub would_import_ids: Vec<u64>,
    pub errors: Vec<SyncError>,
    /// Set when the loop stopped because the caller went away
    pub cancelled: bool,
}

impl SyncReport {
    /// Recompute the summary counts from the id lists.
    pub fn finish(mut self) -> Self {
        self.summary = SyncCounts {
            imported: self.imported_ids.len(),
            already: self.already_ids.len(),
            would_import: self.would_import_ids.len(),
            errors: self.errors.len(),
        };
        self
    }
}
