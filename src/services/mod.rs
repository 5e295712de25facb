// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod import;
pub mod oauth_state;
pub mod preview;
pub mod strava;
pub mod tokens;

pub use import::{ActivityImporter, DedupPolicy, Fingerprint};
pub use oauth_state::OAuthStates;
pub use preview::{build_preview, build_route, ActivityPreview};
pub use strava::{ActivityQuery, StravaClient, StravaService};
pub use tokens::TokenStore;
