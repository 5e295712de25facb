// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared integration test harness: the full router over an in-memory run
//! store, plus an in-process stand-in for the Strava API.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get as route_get, post},
    Form, Json, Router,
};
use chrono::Utc;
use runlog::config::Config;
use runlog::db::RunStore;
use runlog::models::{AthleteProfile, TokenRecord};
use runlog::routes::create_router;
use runlog::AppState;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const ATHLETE_ID: u64 = 4242;
pub const GOOD_CODE: &str = "good-code";

/// Behaviour and call counters of the mock Strava API.
#[derive(Default)]
pub struct MockStrava {
    /// Listing entries, served in order and paginated
    pub activities: Mutex<Vec<Value>>,
    /// Detail responses by activity id
    pub details: Mutex<HashMap<u64, Value>>,
    /// Stream responses by activity id
    pub streams: Mutex<HashMap<u64, Value>>,
    /// Activity ids whose detail fetch fails with 500
    pub failing_details: Mutex<HashSet<u64>>,
    /// Listing pages at or after this number fail with 500
    pub failing_page: Mutex<Option<u32>>,
    /// Artificial latency on refresh exchanges
    pub refresh_delay: Mutex<Duration>,
    /// Query strings seen by the listing endpoint
    pub list_queries: Mutex<Vec<HashMap<String, String>>>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub exchange_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockStrava {
    /// Add a run to the listing and a matching detail record.
    pub fn add_run(&self, id: u64, start_local: &str, meters: f64, moving_time: i64) {
        self.add_activity(id, "Run", start_local, meters, moving_time);
    }

    pub fn add_activity(
        &self,
        id: u64,
        activity_type: &str,
        start_local: &str,
        meters: f64,
        moving_time: i64,
    ) {
        let summary = json!({
            "id": id,
            "name": format!("Activity {id}"),
            "type": activity_type,
            "start_date": start_local,
            "start_date_local": start_local,
            "distance": meters,
            "moving_time": moving_time,
            "total_elevation_gain": 12.0
        });
        self.details.lock().unwrap().insert(id, summary.clone());
        self.activities.lock().unwrap().push(summary);
    }

    pub fn fail_detail(&self, id: u64) {
        self.failing_details.lock().unwrap().insert(id);
    }
}

#[derive(Clone)]
struct MockState(Arc<MockStrava>);

fn bearer_ok(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.starts_with("Bearer "))
}

async fn mock_list(
    State(MockState(mock)): State<MockState>,
    headers: axum::http::HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    mock.list_calls.fetch_add(1, Ordering::SeqCst);
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    mock.list_queries.lock().unwrap().push(query.clone());

    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = query
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(30);

    if let Some(failing) = *mock.failing_page.lock().unwrap() {
        if page as u32 >= failing {
            return (StatusCode::INTERNAL_SERVER_ERROR, "listing unavailable").into_response();
        }
    }

    let items: Vec<Value> = mock
        .activities
        .lock()
        .unwrap()
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Json(items).into_response()
}

async fn mock_detail(
    State(MockState(mock)): State<MockState>,
    Path(id): Path<u64>,
) -> Response {
    mock.detail_calls.fetch_add(1, Ordering::SeqCst);
    if mock.failing_details.lock().unwrap().contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "detail exploded").into_response();
    }
    match mock.details.lock().unwrap().get(&id) {
        Some(detail) => Json(detail.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Record Not Found" })),
        )
            .into_response(),
    }
}

async fn mock_streams(
    State(MockState(mock)): State<MockState>,
    Path(id): Path<u64>,
) -> Json<Value> {
    Json(
        mock.streams
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| json!({})),
    )
}

async fn mock_athlete() -> Json<Value> {
    Json(json!({ "id": ATHLETE_ID, "firstname": "Ada", "lastname": "Runner" }))
}

async fn mock_token(
    State(MockState(mock)): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let expires_at = Utc::now().timestamp() + 6 * 3600;
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            mock.exchange_calls.fetch_add(1, Ordering::SeqCst);
            if form.get("code").map(String::as_str) != Some(GOOD_CODE) {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "Bad Request", "errors": [{ "field": "code" }] })),
                )
                    .into_response();
            }
            Json(json!({
                "token_type": "Bearer",
                "access_token": "exchanged-access",
                "refresh_token": "exchanged-refresh",
                "expires_at": expires_at,
                "athlete": { "id": ATHLETE_ID, "firstname": "Ada", "lastname": "Runner" }
            }))
            .into_response()
        }
        Some("refresh_token") => {
            let n = mock.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = *mock.refresh_delay.lock().unwrap();
            tokio::time::sleep(delay).await;
            if form.get("refresh_token").map(String::as_str) == Some("revoked") {
                return (StatusCode::UNAUTHORIZED, "refresh token revoked").into_response();
            }
            Json(json!({
                "access_token": format!("refreshed-access-{n}"),
                "refresh_token": "rotated-refresh",
                "expires_at": expires_at
            }))
            .into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Start the mock Strava API on an ephemeral local port.
pub async fn spawn_mock_strava() -> (Arc<MockStrava>, SocketAddr) {
    let mock = Arc::new(MockStrava::default());
    let app = Router::new()
        .route("/api/v3/athlete", route_get(mock_athlete))
        .route("/api/v3/athlete/activities", route_get(mock_list))
        .route("/api/v3/activities/{id}", route_get(mock_detail))
        .route("/api/v3/activities/{id}/streams", route_get(mock_streams))
        .route("/oauth/token", post(mock_token))
        .with_state(MockState(mock.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (mock, addr)
}

/// Test configuration pointing at the mock upstream.
pub fn test_config(addr: SocketAddr) -> Config {
    let mut config = Config::test_default();
    config.strava_api_url = format!("http://{addr}/api/v3");
    config.strava_oauth_url = format!("http://{addr}/oauth");
    config
}

/// Create a test app over an in-memory store.
/// Returns the router and the shared state.
pub async fn create_test_app(config: Config) -> (Router, Arc<AppState>) {
    let db = RunStore::in_memory().await.expect("in-memory store");
    let state = Arc::new(AppState::new(config, db).expect("app state"));
    (create_router(state.clone()), state)
}

/// Test app wired to a fresh mock Strava.
#[allow(dead_code)]
pub async fn create_test_app_with_mock() -> (Router, Arc<AppState>, Arc<MockStrava>) {
    let (mock, addr) = spawn_mock_strava().await;
    let (app, state) = create_test_app(test_config(addr)).await;
    (app, state, mock)
}

/// Store a token record that expires `expires_in` seconds from now.
#[allow(dead_code)]
pub fn seed_token(state: &AppState, athlete_id: u64, expires_in: i64, refresh_token: &str) {
    state.strava.tokens().insert(TokenRecord {
        athlete_id,
        access_token: format!("seeded-access-{athlete_id}"),
        refresh_token: refresh_token.to_string(),
        expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
        athlete: AthleteProfile {
            id: athlete_id,
            firstname: Some("Ada".to_string()),
            ..Default::default()
        },
    });
}

/// Send a request, returning status and JSON body (`Null` when empty).
#[allow(dead_code)]
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

/// A valid run creation body.
#[allow(dead_code)]
pub fn run_body(title: &str, started_at: &str, distance: f64, duration_s: i64) -> Value {
    json!({
        "title": title,
        "started_at": started_at,
        "distance": distance,
        "unit": "mi",
        "duration_s": duration_s,
        "run_type": "easy"
    })
}
