// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and
//! FIRESTORE_EMULATOR_HOST to point at it. They are skipped otherwise.

use chrono::{Duration, TimeZone, Utc};
use footprint_tracker::error::AppError;
use footprint_tracker::models::{
    ActivityInput, CalculationType, HistoryEntry, HistoryOrder, HistoryQuery, UserProfile,
};
use footprint_tracker::services::estimator::estimate;

mod common;
use common::{empty_input, test_db};

/// Generate a unique user ID for test isolation.
fn unique_user_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

fn make_entry(user_id: &str, kwh: f64, calculation_type: &str, days_ago: i64) -> HistoryEntry {
    let mut json = empty_input();
    json["calculation_type"] = calculation_type.into();
    json["energy"]["electricity_kwh"] = kwh.into();
    let input: ActivityInput = serde_json::from_value(json).unwrap();
    let estimate = estimate(&input);
    HistoryEntry::new(
        user_id,
        input,
        estimate,
        vec![],
        Utc::now() - Duration::days(days_ago),
    )
}

/// Commit a profile bump plus one entry, returning the new profile.
async fn commit(
    db: &footprint_tracker::db::FirestoreDb,
    prior: Option<UserProfile>,
    entry: &HistoryEntry,
) -> UserProfile {
    let expected = prior.as_ref().map(|p| p.version);
    let mut next = prior.unwrap_or_else(|| UserProfile::placeholder(&entry.user_id, Utc::now()));
    next.total_calculations += 1;
    next.version = expected.map_or(1, |v| v + 1);
    db.commit_progress(expected, &next, Some(entry))
        .await
        .expect("Commit failed");
    next
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_profile_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("profile");

    let before = db.get_profile(&user_id).await.unwrap();
    assert!(before.is_none(), "Profile should not exist before commit");

    let created_at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
    let mut profile = UserProfile::placeholder(&user_id, created_at);
    profile.display_name = Some("Tester".to_string());
    profile.badges.insert("first-step".to_string());
    profile.last_calculation_at = Some(created_at);
    profile.version = 1;

    db.commit_progress(None, &profile, None).await.unwrap();

    let fetched = db.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(fetched, profile);
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("conflict");

    let first = commit(&db, None, &make_entry(&user_id, 0.0, "individual", 0)).await;
    assert_eq!(first.version, 1);

    // A second writer still holding "no profile" must not overwrite
    let mut stale = UserProfile::placeholder(&user_id, Utc::now());
    stale.version = 1;
    let entry = make_entry(&user_id, 0.0, "individual", 0);
    let err = db
        .commit_progress(None, &stale, Some(&entry))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ProfileConflict { .. }));

    // Nothing from the rejected write landed
    assert!(db
        .get_history_entry(&user_id, &entry.id)
        .await
        .unwrap()
        .is_none());
    let stored = db.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.total_calculations, 1);
}

#[tokio::test]
async fn test_offline_client_reports_database_error() {
    let db = footprint_tracker::db::FirestoreDb::new_offline();

    let err = db.get_profile("anyone").await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
// HISTORY TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_history_query_and_count() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("history");

    let mut profile = None;
    let mut ids = vec![];
    for (days_ago, kind) in [(3, "individual"), (2, "family"), (1, "individual")] {
        let entry = make_entry(&user_id, 50.0, kind, days_ago);
        ids.push(entry.id.clone());
        profile = Some(commit(&db, profile, &entry).await);
    }

    let all = db.query_history(&user_id, &HistoryQuery::all()).await.unwrap();
    let all_ids: Vec<_> = all.iter().map(|e| e.id.clone()).collect();
    assert_eq!(all_ids, ids, "Entries should be oldest first");

    let newest = db
        .query_history(
            &user_id,
            &HistoryQuery {
                calculation_type: Some(CalculationType::Individual),
                order: HistoryOrder::NewestFirst,
                limit: Some(1),
                offset: 0,
            },
        )
        .await
        .unwrap();
    assert_eq!(newest.len(), 1);
    assert_eq!(newest[0].id, ids[2]);

    assert_eq!(db.count_history(&user_id, None).await.unwrap(), 3);
    assert_eq!(
        db.count_history(&user_id, Some(CalculationType::Family))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_history_since_spans_users() {
    require_emulator!();

    let db = test_db().await;
    let alice = unique_user_id("since-a");
    let bob = unique_user_id("since-b");

    commit(&db, None, &make_entry(&alice, 0.0, "individual", 0)).await;
    commit(&db, None, &make_entry(&bob, 0.0, "individual", 30)).await;

    let recent = db
        .history_since(Utc::now() - Duration::days(7))
        .await
        .unwrap();
    assert!(recent.iter().any(|e| e.user_id == alice));
    assert!(!recent.iter().any(|e| e.user_id == bob));
}

#[tokio::test]
async fn test_history_delete_is_owner_scoped() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique_user_id("owner");
    let other = unique_user_id("other");

    let entry = make_entry(&owner, 0.0, "individual", 0);
    commit(&db, None, &entry).await;

    assert!(db
        .get_history_entry(&other, &entry.id)
        .await
        .unwrap()
        .is_none());
    assert!(!db.delete_history_entry(&other, &entry.id).await.unwrap());

    assert!(db.delete_history_entry(&owner, &entry.id).await.unwrap());
    assert!(!db.delete_history_entry(&owner, &entry.id).await.unwrap());
    assert_eq!(db.count_history(&owner, None).await.unwrap(), 0);
}
