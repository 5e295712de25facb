// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run persistence backed by SQLite.
//!
//! Every mutation is a single statement (`INSERT`/`UPDATE ... RETURNING`,
//! `DELETE`), so concurrent readers never observe a partially written run.

use crate::db::tables;
use crate::error::AppError;
use crate::models::{Run, RunPayload};
use chrono::DateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

const RUN_COLUMNS: &str = "id, title, description, started_at, distance, unit, duration_s, \
     run_type, elevation_ft, source, source_ref, pace_s, pace";

/// Run store over a SQLite pool.
#[derive(Clone)]
pub struct RunStore {
    pool: SqlitePool,
}

impl RunStore {
    /// Connect to the database at `database_url`, creating it if missing,
    /// and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        tracing::info!(url = database_url, "Connected to run store");

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory store (tests, local experiments).
    ///
    /// A single long-lived connection keeps the in-memory database alive.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create the runs table and its listing index.
    async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                started_at TEXT NOT NULL,
                started_at_epoch INTEGER NOT NULL,
                distance REAL NOT NULL CHECK (distance > 0),
                unit TEXT NOT NULL DEFAULT 'mi' CHECK (unit IN ('mi', 'km')),
                duration_s INTEGER NOT NULL CHECK (duration_s > 0),
                run_type TEXT NOT NULL DEFAULT 'easy',
                elevation_ft REAL,
                source TEXT,
                source_ref TEXT,
                pace_s INTEGER,
                pace TEXT
            )
            "#,
            table = tables::RUNS
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_runs_started_at ON {} (started_at_epoch DESC, id DESC)",
            tables::RUNS
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All runs, newest start first, ties broken by id descending.
    pub async fn list(&self) -> Result<Vec<Run>, AppError> {
        let rows: Vec<RunRow> = sqlx::query_as(&format!(
            "SELECT {RUN_COLUMNS} FROM {} ORDER BY started_at_epoch DESC, id DESC",
            tables::RUNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Run::try_from).collect()
    }

    /// Get a run by id.
    pub async fn get(&self, id: i64) -> Result<Option<Run>, AppError> {
        let row: Option<RunRow> = sqlx::query_as(&format!(
            "SELECT {RUN_COLUMNS} FROM {} WHERE id = ?",
            tables::RUNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Run::try_from).transpose()
    }

    /// Insert a run, deriving pace fields. Returns the stored record.
    pub async fn create(&self, payload: RunPayload) -> Result<Run, AppError> {
        let p = payload.normalized()?;

        let row: RunRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO {} (title, description, started_at, started_at_epoch, distance, unit,
                            duration_s, run_type, elevation_ft, source, source_ref, pace_s, pace)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {RUN_COLUMNS}
            "#,
            tables::RUNS
        ))
        .bind(&p.title)
        .bind(&p.description)
        .bind(p.started_at.to_rfc3339())
        .bind(p.started_at.timestamp())
        .bind(p.distance)
        .bind(p.unit.as_str())
        .bind(p.duration_s)
        .bind(p.run_type.as_str())
        .bind(p.elevation_ft)
        .bind(&p.source)
        .bind(&p.source_ref)
        .bind(p.pace_s)
        .bind(&p.pace)
        .fetch_one(&self.pool)
        .await?;

        let run = Run::try_from(row)?;
        tracing::debug!(run_id = run.id, source = ?run.source, "Run created");
        Ok(run)
    }

    /// Replace every field of an existing run. `None` when the id is unknown.
    pub async fn update(&self, id: i64, payload: RunPayload) -> Result<Option<Run>, AppError> {
        let p = payload.normalized()?;

        let row: Option<RunRow> = sqlx::query_as(&format!(
            r#"
            UPDATE {} SET title = ?, description = ?, started_at = ?, started_at_epoch = ?,
                distance = ?, unit = ?, duration_s = ?, run_type = ?, elevation_ft = ?,
                source = ?, source_ref = ?, pace_s = ?, pace = ?
            WHERE id = ?
            RETURNING {RUN_COLUMNS}
            "#,
            tables::RUNS
        ))
        .bind(&p.title)
        .bind(&p.description)
        .bind(p.started_at.to_rfc3339())
        .bind(p.started_at.timestamp())
        .bind(p.distance)
        .bind(p.unit.as_str())
        .bind(p.duration_s)
        .bind(p.run_type.as_str())
        .bind(p.elevation_ft)
        .bind(&p.source)
        .bind(&p.source_ref)
        .bind(p.pace_s)
        .bind(&p.pace)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Run::try_from).transpose()
    }

    /// Delete a run. Deleting an unknown id is not an error; the return value
    /// reports whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", tables::RUNS))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Raw row as stored in SQLite.
#[derive(FromRow)]
struct RunRow {
    id: i64,
    title: String,
    description: Option<String>,
    started_at: String,
    distance: f64,
    unit: String,
    duration_s: i64,
    run_type: String,
    elevation_ft: Option<f64>,
    source: Option<String>,
    source_ref: Option<String>,
    pace_s: Option<i64>,
    pace: Option<String>,
}

impl TryFrom<RunRow> for Run {
    type Error = AppError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let started_at = DateTime::parse_from_rfc3339(&row.started_at).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Corrupt started_at for run {}: {}",
                row.id,
                e
            ))
        })?;

        Ok(Run {
            id: row.id,
            title: row.title,
            description: row.description,
            started_at,
            distance: row.distance,
            unit: row.unit.parse()?,
            duration_s: row.duration_s,
            run_type: row.run_type.parse()?,
            elevation_ft: row.elevation_ft,
            source: row.source,
            source_ref: row.source_ref,
            pace_s: row.pace_s,
            pace: row.pace,
        })
    }
}
