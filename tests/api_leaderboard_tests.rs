// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard endpoint tests.

use axum::http::StatusCode;
use chrono::Utc;
use footprint_tracker::config::Config;
use footprint_tracker::models::{ActivityInput, ProfileUpdate};
use footprint_tracker::AppState;
use std::time::Duration;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_app_with_config, empty_input, json_body, request};

async fn calculate(state: &AppState, user_id: &str, kwh: f64) {
    let mut json = empty_input();
    json["energy"]["electricity_kwh"] = kwh.into();
    let input: ActivityInput = serde_json::from_value(json).unwrap();
    state
        .progression
        .record_calculation(user_id, input, Utc::now())
        .await
        .unwrap();
}

async fn rename(state: &AppState, user_id: &str, name: &str) {
    let update = ProfileUpdate {
        display_name: Some(name.to_string()),
        ..Default::default()
    };
    state
        .progression
        .update_settings(user_id, update, Utc::now())
        .await
        .unwrap();
}

/// Three users: 136.4, 243.0 and 669.4 kg/month.
async fn seed(state: &AppState) {
    calculate(state, "low", 0.0).await;
    calculate(state, "mid", 100.0).await;
    calculate(state, "high", 500.0).await;
    rename(state, "low", "Low Emitter").await;
}

fn user_ids(json: &serde_json::Value) -> Vec<String> {
    json["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["user_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_month_leaderboard_lowest_first() {
    let (app, state) = create_test_app();
    seed(&state).await;

    let response = app
        .oneshot(request("GET", "/api/leaderboard?period=month", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    assert_eq!(json["period"], "month");
    assert_eq!(json["stale"], false);
    assert_eq!(user_ids(&json), vec!["low", "mid", "high"]);

    let first = &json["entries"][0];
    assert_eq!(first["rank"], 1);
    assert_eq!(first["display_name"], "Low Emitter");
    assert_eq!(first["score"], 136.4);
    assert_eq!(json["entries"][1]["display_name"], "Anonymous");

    assert_eq!(json["stats"]["total_users"], 3);
    assert_eq!(json["stats"]["total_calculations"], 3);
    assert_eq!(json["stats"]["average_footprint"], 349.6);
}

#[tokio::test]
async fn test_leaderboard_default_period_and_limit() {
    let (app, state) = create_test_app();
    seed(&state).await;

    let response = app
        .oneshot(request("GET", "/api/leaderboard?limit=2", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    assert_eq!(json["period"], "month");
    assert_eq!(user_ids(&json), vec!["low", "mid"]);
    // Stats still cover the whole window
    assert_eq!(json["stats"]["total_users"], 3);
}

#[tokio::test]
async fn test_leaderboard_invalid_period_is_400() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(request("GET", "/api/leaderboard?period=decade", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_opted_out_user_is_hidden() {
    let (app, state) = create_test_app();
    seed(&state).await;

    let update = serde_json::json!({ "preferences": { "public_profile": false } });
    let response = app
        .clone()
        .oneshot(request("PUT", "/api/profile", Some("low"), Some(&update)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/api/leaderboard?period=week", None, None))
        .await
        .unwrap();
    let json = json_body(response).await;

    assert_eq!(user_ids(&json), vec!["mid", "high"]);
    assert_eq!(json["entries"][0]["rank"], 1);
    assert_eq!(json["stats"]["total_users"], 2);
}

#[tokio::test]
async fn test_empty_leaderboard() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(request("GET", "/api/leaderboard?period=year", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    assert!(json["entries"].as_array().unwrap().is_empty());
    assert_eq!(json["stats"]["total_users"], 0);
    assert_eq!(json["stats"]["average_footprint"], 0.0);
}

#[tokio::test]
async fn test_community_leaderboard_highest_first() {
    let (app, state) = create_test_app();
    seed(&state).await;

    // A second badge puts "high" ahead on community score
    for _ in 0..5 {
        state
            .progression
            .record_community_action("high", Utc::now())
            .await
            .unwrap();
    }
    // No calculations, so never ranked
    state
        .progression
        .record_community_action("lurker", Utc::now())
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/api/leaderboard/community", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    assert!(json["period"].is_null());
    let ids = user_ids(&json);
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], "high");
    // streak 1 × 10 + 2 badges × 50
    assert_eq!(json["entries"][0]["score"], 110.0);
    assert_eq!(json["entries"][0]["badge_count"], 2);
    assert!(!ids.contains(&"lurker".to_string()));
}

#[tokio::test]
async fn test_cached_leaderboard_sees_new_calculation() {
    let config = Config {
        leaderboard_cache_ttl: Duration::from_secs(300),
        ..Config::test_default()
    };
    let (app, _state) = create_test_app_with_config(config);

    // Warm the cache with an empty board
    let response = app
        .clone()
        .oneshot(request("GET", "/api/leaderboard", None, None))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert!(json["entries"].as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/calculate",
            Some("alice"),
            Some(&empty_input()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/leaderboard", None, None))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["stale"], false);
    assert_eq!(user_ids(&json), vec!["alice"]);

    // Opting out is a profile write too
    let update = serde_json::json!({ "preferences": { "public_profile": false } });
    app.clone()
        .oneshot(request("PUT", "/api/profile", Some("alice"), Some(&update)))
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/api/leaderboard", None, None))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert!(json["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_global_stats() {
    let (app, state) = create_test_app();

    let response = app
        .clone()
        .oneshot(request("GET", "/api/stats", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["total_calculations"], 0);
    assert!(json["monthly_growth"].as_array().unwrap().is_empty());

    seed(&state).await;
    calculate(&state, "low", 0.0).await;

    let response = app
        .oneshot(request("GET", "/api/stats", None, None))
        .await
        .unwrap();
    let json = json_body(response).await;

    assert_eq!(json["total_calculations"], 4);
    assert_eq!(json["total_users"], 3);
    // (136.4 × 2 + 243.0 + 669.4) / 4
    assert_eq!(json["average_footprint"], 296.3);
    // Only 13.6 × 2 below the regional average against 93.0 + 519.4 above
    assert_eq!(json["total_emissions_saved"], 0.0);
    assert_eq!(json["category_breakdown"]["food"], 136.4);

    let growth = json["monthly_growth"].as_array().unwrap();
    assert_eq!(growth.len(), 1);
    assert_eq!(growth[0]["calculations"], 4);
    assert_eq!(growth[0]["users"], 3);
}
