// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for the Strava read routes and single-activity import.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::ATHLETE_ID;

const EXAMPLE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

#[tokio::test]
async fn test_status_reports_connection() {
    let (app, state, _mock) = common::create_test_app_with_mock().await;

    let (status, body) = common::get(&app, &format!("/strava/status?athlete_id={ATHLETE_ID}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "connected": false }));

    common::seed_token(&state, ATHLETE_ID, 3600, "refresh");
    let (status, body) = common::get(&app, &format!("/strava/status?athlete_id={ATHLETE_ID}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);
    assert_eq!(body["athlete_id"], ATHLETE_ID);
    assert_eq!(body["athlete"]["firstname"], "Ada");
    assert!(body["expires_at"].as_str().unwrap().ends_with('Z'));

    // Without an id and without dev auto-athlete, nobody is resolved
    let (status, body) = common::get(&app, "/strava/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], false);
}

#[tokio::test]
async fn test_me_proxies_profile() {
    let (app, state, _mock) = common::create_test_app_with_mock().await;
    common::seed_token(&state, ATHLETE_ID, 3600, "refresh");

    let (status, body) = common::get(&app, &format!("/strava/me?athlete_id={ATHLETE_ID}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], ATHLETE_ID);
    assert_eq!(body["lastname"], "Runner");
}

#[tokio::test]
async fn test_activity_listing_filters_and_converts() {
    let (app, state, mock) = common::create_test_app_with_mock().await;
    common::seed_token(&state, ATHLETE_ID, 3600, "refresh");
    mock.add_run(1, "2025-03-01T07:00:00Z", 8046.72, 2400);
    mock.add_activity(2, "Ride", "2025-03-02T07:00:00Z", 30000.0, 3600);
    mock.add_activity(3, "run", "2025-03-03T07:00:00Z", 5000.0, 1500);

    let (status, body) =
        common::get(&app, &format!("/strava/activities?athlete_id={ATHLETE_ID}")).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[0]["type"], "Run");
    assert_eq!(items[0]["distance"], 5.0);
    assert_eq!(items[0]["unit"], "mi");
    assert_eq!(items[0]["moving_time_s"], 2400);
    assert_eq!(items[0]["start_date"], "2025-03-01T07:00:00Z");
    assert_eq!(items[1]["id"], 3);

    let last_query = mock.list_queries.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last_query.get("per_page").map(String::as_str), Some("30"));
    assert_eq!(last_query.get("page").map(String::as_str), Some("1"));

    let (_, body) = common::get(
        &app,
        &format!("/strava/activities?athlete_id={ATHLETE_ID}&activity_type=&unit=km"),
    )
    .await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["distance"], 8.05);
    assert_eq!(items[0]["unit"], "km");

    let (_, body) = common::get(
        &app,
        &format!("/strava/activities?athlete_id={ATHLETE_ID}&activity_type=ride"),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_activity_listing_rejects_bad_paging() {
    let (app, state, mock) = common::create_test_app_with_mock().await;
    common::seed_token(&state, ATHLETE_ID, 3600, "refresh");

    for query in ["page=0", "page=201", "per_page=0", "per_page=500", "after=soon"] {
        let (status, _) = common::get(
            &app,
            &format!("/strava/activities?athlete_id={ATHLETE_ID}&{query}"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
    }
    assert_eq!(mock.list_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_route_from_stream_and_polyline() {
    let (app, state, mock) = common::create_test_app_with_mock().await;
    common::seed_token(&state, ATHLETE_ID, 3600, "refresh");
    mock.add_run(1, "2025-03-01T07:00:00Z", 5000.0, 1500);
    mock.streams.lock().unwrap().insert(
        1,
        json!({ "latlng": { "data": [[37.40, -122.10], [37.42, -122.12]] } }),
    );
    mock.details.lock().unwrap().insert(
        2,
        json!({ "id": 2, "map": { "summary_polyline": EXAMPLE_POLYLINE } }),
    );

    let (status, body) = common::get(
        &app,
        &format!("/strava/activities/1/route?athlete_id={ATHLETE_ID}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["polyline"], json!([[37.40, -122.10], [37.42, -122.12]]));
    assert_eq!(body["bounds"]["min_lng"], -122.12);
    assert_eq!(body["bounds"]["max_lat"], 37.42);

    let (status, body) = common::get(
        &app,
        &format!("/strava/activities/2/route?athlete_id={ATHLETE_ID}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["polyline"].as_array().unwrap().len(), 3);

    // No stream and no activity
    let (status, body) = common::get(
        &app,
        &format!("/strava/activities/99/route?athlete_id={ATHLETE_ID}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["upstream_status"], 404);
}

#[tokio::test]
async fn test_preview_combines_detail_and_streams() {
    let (app, state, mock) = common::create_test_app_with_mock().await;
    common::seed_token(&state, ATHLETE_ID, 3600, "refresh");
    mock.details.lock().unwrap().insert(
        5,
        json!({
            "id": 5,
            "name": "Tempo",
            "distance": 3218.688,
            "moving_time": 960,
            "total_elevation_gain": 0.0,
            "average_heartrate": 151.0,
            "splits_standard": [
                { "distance": 1609.3, "moving_time": 480, "average_speed": 3.3528 },
                { "distance": 1609.4, "moving_time": 480, "average_speed": 3.3528 }
            ]
        }),
    );
    mock.streams.lock().unwrap().insert(
        5,
        json!({
            "latlng": { "data": [[37.40, -122.10], [37.41, -122.11]] },
            "time": { "data": [0, 480] },
            "velocity_smooth": { "data": [3.3528, 0.0] },
            "heartrate": { "data": [140.0, 160.0] }
        }),
    );

    let (status, body) = common::get(
        &app,
        &format!("/strava/activities/5/preview?athlete_id={ATHLETE_ID}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["unit"], "mi");
    assert_eq!(body["summary"]["duration_s"], 960);
    assert_eq!(body["summary"]["avg_hr"], 151.0);
    assert!((body["summary"]["avg_pace_s"].as_f64().unwrap() - 480.0).abs() < 1e-6);
    assert_eq!(body["polyline"].as_array().unwrap().len(), 2);
    assert_eq!(body["series"]["t_s"], json!([0, 480]));
    assert!(body["series"]["pace_s"][1].is_null());
    assert_eq!(body["series"]["hr_bpm"], json!([140.0, 160.0]));
    assert_eq!(body["splits"].as_array().unwrap().len(), 2);
    assert_eq!(body["splits"][1]["index"], 2);
}

#[tokio::test]
async fn test_import_single_activity() {
    let (app, state, mock) = common::create_test_app_with_mock().await;
    common::seed_token(&state, ATHLETE_ID, 3600, "refresh");
    mock.add_run(1, "2025-03-04T07:00:00Z", 5000.0, 1500);

    let (status, body) = common::send(
        &app,
        "POST",
        "/runs/from-strava",
        Some(json!({
            "activity_id": 1,
            "athlete_id": ATHLETE_ID,
            "title": "Parkrun",
            "unit": "km",
            "run_type": "race"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Parkrun");
    assert_eq!(body["distance"], 5.0);
    assert_eq!(body["unit"], "km");
    assert_eq!(body["run_type"], "race");
    assert_eq!(body["pace_s"], 300);
    assert_eq!(body["pace"], "05:00");
    assert_eq!(body["source"], "strava");
    assert_eq!(body["source_ref"], "1");
    assert_eq!(body["description"], "");

    let id = body["id"].as_i64().unwrap();
    let (status, stored) = common::get(&app, &format!("/runs/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, body);
}

#[tokio::test]
async fn test_import_single_activity_errors() {
    let (app, state, _mock) = common::create_test_app_with_mock().await;

    // Unknown athlete
    let (status, _) = common::send(
        &app,
        "POST",
        "/runs/from-strava",
        Some(json!({ "activity_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::send(
        &app,
        "POST",
        "/runs/from-strava",
        Some(json!({ "activity_id": 1, "athlete_id": ATHLETE_ID })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::seed_token(&state, ATHLETE_ID, 3600, "refresh");
    let (status, body) = common::send(
        &app,
        "POST",
        "/runs/from-strava",
        Some(json!({ "activity_id": 77, "athlete_id": ATHLETE_ID })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["upstream_status"], 404);

    let (_, runs) = common::get(&app, "/runs").await;
    assert_eq!(runs, json!([]));
}
