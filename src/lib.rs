// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Runlog: a personal running log with Strava import.
//!
//! This crate provides the backend API for recording runs, computing
//! pace/time/distance, and importing runs from Strava.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pace;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::RunStore;
use error::AppError;
use services::{ActivityImporter, DedupPolicy, OAuthStates, StravaClient, StravaService, TokenStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: RunStore,
    pub strava: StravaService,
    pub oauth_states: OAuthStates,
    pub importer: ActivityImporter,
}

impl AppState {
    /// Wire up services over an opened run store.
    pub fn new(config: Config, db: RunStore) -> Result<Self, AppError> {
        let client = StravaClient::new(&config)?;
        let strava = StravaService::new(client, TokenStore::new(), config.dev_auto_athlete);
        let oauth_states = OAuthStates::new(config.oauth_state_key.clone());
        let importer = ActivityImporter::new(
            strava.clone(),
            db.clone(),
            DedupPolicy::from_config(&config),
            config.sync_page_size,
        );

        Ok(Self {
            config,
            db,
            strava,
            oauth_states,
            importer,
        })
    }
}
