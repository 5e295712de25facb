// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity import and bulk sync.
//!
//! Handles two workflows:
//! 1. Single import: fetch one Strava activity, map it, store it as a run
//! 2. Bulk sync: page through the athlete's runs and import the ones that
//!    don't already have a matching stored run
//!
//! Bulk sync matches stored runs by a (day, distance bucket, duration bucket)
//! fingerprint rather than by `source_ref`, so runs entered by hand or
//! imported before provenance was recorded are still recognized.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::db::RunStore;
use crate::error::Result;
use crate::models::{
    ActivityDetail, ActivitySummary, ImportOverrides, Run, RunPayload, RunType, SyncError,
    SyncOptions, SyncReport, Unit,
};
use crate::services::strava::{ActivityQuery, StravaService};

/// Title used when neither the caller nor Strava provides one.
pub const FALLBACK_TITLE: &str = "Strava Run";

/// Provenance recorded on imported runs.
pub const SOURCE_STRAVA: &str = "strava";

const FEET_PER_METER: f64 = 3.28084;

/// Bucket widths used when fingerprinting runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupPolicy {
    /// Distance bucket, in units
    pub distance_bucket: f64,
    /// Duration bucket, in seconds
    pub duration_bucket_secs: i64,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            distance_bucket: 0.02,
            duration_bucket_secs: 10,
        }
    }
}

impl DedupPolicy {
    /// Policy from configuration; non-positive widths fall back to the defaults.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            distance_bucket: if config.dedup_distance_bucket > 0.0 {
                config.dedup_distance_bucket
            } else {
                defaults.distance_bucket
            },
            duration_bucket_secs: if config.dedup_duration_bucket_secs > 0 {
                config.dedup_duration_bucket_secs
            } else {
                defaults.duration_bucket_secs
            },
        }
    }

    pub fn fingerprint(&self, day: NaiveDate, distance: f64, duration_s: i64) -> Fingerprint {
        Fingerprint {
            day,
            distance_bucket: (distance / self.distance_bucket).round() as i64,
            duration_bucket: (duration_s as f64 / self.duration_bucket_secs as f64).round() as i64,
        }
    }

    /// Fingerprint of a stored run, with its distance expressed in `unit`.
    pub fn for_run(&self, run: &Run, unit: Unit) -> Fingerprint {
        self.fingerprint(
            run.started_at.date_naive(),
            unit.convert_from(run.distance, run.unit),
            run.duration_s,
        )
    }

    /// Fingerprint of a listing entry. `None` when it has no usable start date.
    ///
    /// The distance is rounded the way [`map_activity`] stores it, so the key
    /// matches the run an import of this entry would create.
    pub fn for_summary(&self, activity: &ActivitySummary, unit: Unit) -> Option<Fingerprint> {
        let day = activity.start().and_then(calendar_day)?;
        Some(self.fingerprint(
            day,
            round3(unit.from_meters(activity.distance)),
            activity.moving_time,
        ))
    }
}

/// Likely-duplicate key for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub day: NaiveDate,
    pub distance_bucket: i64,
    pub duration_bucket: i64,
}

/// Date portion of a timestamp string, ignoring time of day and offset.
fn calendar_day(timestamp: &str) -> Option<NaiveDate> {
    let date = timestamp.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn parse_start(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    value.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

/// Map a Strava activity onto a run payload.
///
/// Never fails: a missing or unparsable start time becomes `now`.
pub fn map_activity(
    activity: &ActivityDetail,
    overrides: &ImportOverrides,
    now: DateTime<Utc>,
) -> RunPayload {
    let unit = overrides.unit.unwrap_or_default();

    let title = overrides
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| activity.name.clone().filter(|n| !n.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let started_at = parse_start(activity.start_date_local.as_deref())
        .or_else(|| parse_start(activity.start_date.as_deref()))
        .unwrap_or_else(|| now.fixed_offset());

    RunPayload {
        title,
        description: Some(activity.description.clone().unwrap_or_default()),
        started_at,
        distance: round3(unit.from_meters(activity.distance.unwrap_or(0.0))),
        unit,
        duration_s: activity.moving_time.unwrap_or(0),
        run_type: overrides.run_type.unwrap_or(RunType::Easy),
        elevation_ft: activity.total_elevation_gain.map(|m| m * FEET_PER_METER),
        source: Some(SOURCE_STRAVA.to_string()),
        source_ref: Some(activity.id.to_string()),
        pace_s: None,
        pace: None,
    }
}

/// Imports Strava activities into the run store.
#[derive(Clone)]
pub struct ActivityImporter {
    strava: StravaService,
    runs: RunStore,
    policy: DedupPolicy,
    page_size: u32,
}

impl ActivityImporter {
    pub fn new(strava: StravaService, runs: RunStore, policy: DedupPolicy, page_size: u32) -> Self {
        Self {
            strava,
            runs,
            policy,
            page_size: page_size.max(1),
        }
    }

    /// Import a single activity. Always creates a new run: an explicit
    /// import is not deduplicated.
    pub async fn import_activity(
        &self,
        athlete_id: Option<u64>,
        activity_id: u64,
        overrides: &ImportOverrides,
    ) -> Result<Run> {
        let athlete_id = self.strava.resolve_athlete(athlete_id)?;
        tracing::info!(athlete_id, activity_id, "Importing activity");

        let detail = self
            .strava
            .get_activity_detail(athlete_id, activity_id)
            .await?;
        let payload = map_activity(&detail, overrides, Utc::now());
        let run = self.runs.create(payload).await?;

        tracing::info!(athlete_id, activity_id, run_id = run.id, "Activity imported");
        Ok(run)
    }

    /// Bulk-import the athlete's runs, skipping likely duplicates.
    ///
    /// Fails only when the athlete or token cannot be resolved. Page fetch
    /// failures end the loop; per-activity failures are collected in the
    /// report and still consume budget.
    pub async fn sync(
        &self,
        athlete_id: Option<u64>,
        options: &SyncOptions,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let athlete_id = self.strava.resolve_athlete(athlete_id)?;
        self.strava.get_token(athlete_id).await?;

        let unit = options.unit;
        let mut seen: HashSet<Fingerprint> = self
            .runs
            .list()
            .await?
            .iter()
            .map(|run| self.policy.for_run(run, unit))
            .collect();

        tracing::info!(
            athlete_id,
            max_import = options.max_import,
            dry_run = options.dry_run,
            known = seen.len(),
            "Starting sync"
        );

        let overrides = ImportOverrides {
            unit: Some(unit),
            ..Default::default()
        };
        let mut report = SyncReport::default();
        let mut remaining = options.max_import;
        let mut page = 1u32;

        'pages: while remaining > 0 {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let query = ActivityQuery {
                page,
                per_page: self.page_size,
                after: options.after,
                activity_type: Some("Run".to_string()),
            };

            let items = match self.strava.list_activities_page(athlete_id, &query).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(athlete_id, page, error = %e, "Page fetch failed, ending sync");
                    break;
                }
            };
            if items.is_empty() {
                break;
            }

            for activity in items.iter().filter(|a| query.matches(a)) {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'pages;
                }
                if remaining == 0 {
                    break 'pages;
                }

                let fingerprint = self.policy.for_summary(activity, unit);
                if let Some(fp) = fingerprint {
                    if seen.contains(&fp) {
                        tracing::debug!(activity_id = activity.id, ?fp, "Already present");
                        report.already_ids.push(activity.id);
                        continue;
                    }
                }

                remaining -= 1;

                if options.dry_run {
                    tracing::debug!(activity_id = activity.id, "Would import");
                    report.would_import_ids.push(activity.id);
                    seen.extend(fingerprint);
                    continue;
                }

                match self
                    .import_activity(Some(athlete_id), activity.id, &overrides)
                    .await
                {
                    Ok(_) => {
                        // Same key a dry run records
                        report.imported_ids.push(activity.id);
                        seen.extend(fingerprint);
                    }
                    Err(e) => {
                        tracing::warn!(
                            athlete_id,
                            activity_id = activity.id,
                            error = %e,
                            "Import failed during sync"
                        );
                        report.errors.push(SyncError {
                            activity_id: activity.id,
                            status: e.upstream_status(),
                            detail: e.to_string(),
                        });
                    }
                }
            }

            page += 1;
        }

        let report = report.finish();
        tracing::info!(
            athlete_id,
            imported = report.summary.imported,
            already = report.summary.already,
            would_import = report.summary.would_import,
            errors = report.summary.errors,
            cancelled = report.cancelled,
            "Sync finished"
        );
        Ok(report)
    }
}
