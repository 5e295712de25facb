// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store of OAuth token records.
//!
//! Created once at startup and shared through `AppState`. Records live for
//! the lifetime of the process.

use crate::models::TokenRecord;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Token records keyed by Strava athlete ID, plus one refresh lock per athlete.
#[derive(Clone, Default)]
pub struct TokenStore {
    records: Arc<DashMap<u64, TokenRecord>>,
    /// Per-athlete mutex serializing refresh exchanges.
    refresh_locks: Arc<DashMap<u64, Arc<Mutex<()>>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the record for an athlete.
    pub fn get(&self, athlete_id: u64) -> Option<TokenRecord> {
        self.records.get(&athlete_id).map(|r| r.clone())
    }

    /// Insert or replace the record for `record.athlete_id`.
    pub fn insert(&self, record: TokenRecord) {
        self.records.insert(record.athlete_id, record);
    }

    /// The connected athlete, if exactly one is connected.
    pub fn sole_athlete(&self) -> Option<u64> {
        if self.records.len() != 1 {
            return None;
        }
        self.records.iter().next().map(|entry| *entry.key())
    }

    /// Lock guarding refresh for one athlete.
    pub(crate) fn refresh_lock(&self, athlete_id: u64) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(athlete_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
