// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for calculations, history, profile and badges.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{
    ActivityInput, BadgeDefinition, CalculationType, EmissionEstimate, HistoryEntry,
    HistoryOrder, HistoryQuery, HistoryStats, ProfileUpdate, UserProfile,
};
use crate::services::estimator::estimate;
use crate::services::insights::{generate_insights, improvement_tips};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 100;

/// Routes that need a caller identity.
/// The identity middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/calculate", post(calculate))
        .route("/api/history", get(list_history))
        .route(
            "/api/history/{id}",
            get(get_history_entry).delete(delete_history_entry),
        )
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/badges", get(get_badges))
        .route("/api/community/actions", post(record_community_action))
}

/// Routes that work without a caller identity.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/estimate", post(estimate_only))
}

fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

// ─── Profile ─────────────────────────────────────────────────

/// Profile with derived fields.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub profile: UserProfile,
    pub level: u32,
    /// Coins still needed for the next level
    pub coins_to_next_level: u32,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let level = profile.level();
        let next_level_at = level * crate::models::profile::COINS_PER_LEVEL;
        Self {
            coins_to_next_level: next_level_at.saturating_sub(profile.coins),
            level,
            profile,
        }
    }
}

/// Get the caller's profile (empty progression if nothing recorded yet).
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .progression
        .profile_or_placeholder(&user.user_id, Utc::now())
        .await?;
    Ok(Json(profile.into()))
}

/// Update display name, monthly goal or preferences.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<ProfileResponse>> {
    let update = json_body(body)?;
    let profile = state
        .progression
        .update_settings(&user.user_id, update, Utc::now())
        .await?;

    tracing::info!(user_id = %user.user_id, "Profile settings updated");
    Ok(Json(profile.into()))
}

// ─── Calculations ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalculateResponse {
    pub entry_id: String,
    pub estimate: EmissionEstimate,
    pub insights: Vec<String>,
    pub profile: ProfileResponse,
    pub newly_earned: Vec<String>,
}

/// Record a calculation: estimate, advance progression, award badges.
async fn calculate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<ActivityInput>, JsonRejection>,
) -> Result<Json<CalculateResponse>> {
    let input = json_body(body)?;
    let outcome = state
        .progression
        .record_calculation(&user.user_id, input, Utc::now())
        .await?;

    Ok(Json(CalculateResponse {
        entry_id: outcome.entry.id,
        estimate: outcome.entry.estimate,
        insights: outcome.entry.insights,
        profile: outcome.profile.into(),
        newly_earned: outcome.newly_earned.into_iter().collect(),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EstimateResponse {
    pub estimate: EmissionEstimate,
    pub insights: Vec<String>,
    pub tips: Vec<String>,
}

/// Estimate without recording anything.
async fn estimate_only(
    body: std::result::Result<Json<ActivityInput>, JsonRejection>,
) -> Result<Json<EstimateResponse>> {
    let input = json_body(body)?;
    validator::Validate::validate(&input)?;

    let estimate = estimate(&input);
    Ok(Json(EstimateResponse {
        insights: generate_insights(&estimate),
        tips: improvement_tips(&estimate),
        estimate,
    }))
}

// ─── History ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct HistoryParams {
    #[serde(rename = "type")]
    calculation_type: Option<CalculationType>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryResponse {
    /// Newest first
    pub entries: Vec<HistoryEntry>,
    pub total: u32,
    pub has_more: bool,
    pub stats: HistoryStats,
}

/// Page through the caller's calculations.
async fn list_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    params: std::result::Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let page_query = HistoryQuery {
        calculation_type: params.calculation_type,
        order: HistoryOrder::NewestFirst,
        limit: Some(limit),
        offset,
    };

    let all_query = HistoryQuery::all();
    let (entries, total, all) = futures_util::try_join!(
        state.store.query_history(&user.user_id, &page_query),
        state
            .store
            .count_history(&user.user_id, params.calculation_type),
        state.store.query_history(&user.user_id, &all_query),
    )?;

    let has_more = offset as usize + entries.len() < total as usize;

    Ok(Json(HistoryResponse {
        entries,
        total,
        has_more,
        stats: HistoryStats::from_entries(&all, Utc::now()),
    }))
}

async fn get_history_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<HistoryEntry>> {
    let entry = state
        .store
        .get_history_entry(&user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("History entry {}", id)))?;

    Ok(Json(entry))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Delete one of the caller's entries. Repeating the call is harmless.
///
/// Profile aggregates and badges are left as they are.
async fn delete_history_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.store.delete_history_entry(&user.user_id, &id).await?;

    if deleted {
        state.leaderboard.invalidate();
        tracing::info!(user_id = %user.user_id, entry_id = %id, "History entry deleted");
    }
    Ok(Json(DeleteResponse { deleted }))
}

// ─── Badges ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BadgeStatus {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub definition: BadgeDefinition,
    pub earned: bool,
    /// Criteria currently met but not yet awarded
    pub eligible: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BadgesResponse {
    pub badges: Vec<BadgeStatus>,
    pub earned_count: u32,
    pub coins: u32,
    pub level: u32,
}

/// Badge catalog annotated with the caller's progress.
async fn get_badges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BadgesResponse>> {
    let (profile, evaluation) = state
        .progression
        .badge_status(&user.user_id, Utc::now())
        .await?;

    let badges: Vec<BadgeStatus> = state
        .catalog
        .definitions()
        .iter()
        .map(|def| BadgeStatus {
            earned: profile.badges.contains(&def.id),
            eligible: evaluation.eligible_not_yet_earned.contains(&def.id),
            definition: def.clone(),
        })
        .collect();

    Ok(Json(BadgesResponse {
        earned_count: badges.iter().filter(|b| b.earned).count() as u32,
        badges,
        coins: profile.coins,
        level: profile.level(),
    }))
}

// ─── Community ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommunityActionResponse {
    pub community_actions: u32,
    pub newly_earned: Vec<String>,
    pub profile: ProfileResponse,
}

/// Count one qualifying community action (post, helpful reply) for the caller.
async fn record_community_action(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CommunityActionResponse>> {
    let (profile, newly_earned) = state
        .progression
        .record_community_action(&user.user_id, Utc::now())
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        community_actions = profile.community_actions,
        "Community action recorded"
    );

    Ok(Json(CommunityActionResponse {
        community_actions: profile.community_actions,
        newly_earned: newly_earned.into_iter().collect(),
        profile: profile.into(),
    }))
}
