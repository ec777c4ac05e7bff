// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard routes.

use crate::error::{AppError, Result};
use crate::models::{LeaderboardEntry, Period, WindowStats};
use crate::services::{Board, RankingView};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leaderboard", get(period_leaderboard))
        .route("/api/leaderboard/community", get(community_leaderboard))
}

#[derive(Deserialize)]
struct LeaderboardParams {
    period: Option<Period>,
    limit: Option<usize>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    /// Absent for the community board
    pub period: Option<Period>,
    pub entries: Vec<LeaderboardEntry>,
    pub stats: WindowStats,
    /// True when a fresh ranking could not be computed in time
    pub stale: bool,
    pub computed_at: String,
}

impl LeaderboardResponse {
    fn from_view(period: Option<Period>, view: RankingView, limit: usize) -> Self {
        Self {
            period,
            entries: view.ranking.top(limit),
            stats: view.ranking.stats.clone(),
            stale: view.stale,
            computed_at: format_utc_rfc3339(view.computed_at),
        }
    }
}

fn parse_params(
    params: std::result::Result<Query<LeaderboardParams>, QueryRejection>,
) -> Result<(Option<Period>, usize)> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok((params.period, limit))
}

/// Footprint ranking for a week, month or year window (lowest first).
async fn period_leaderboard(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<LeaderboardParams>, QueryRejection>,
) -> Result<Json<LeaderboardResponse>> {
    let (period, limit) = parse_params(params)?;
    let period = period.unwrap_or_default();

    let view = state
        .leaderboard
        .ranking(Board::Period(period), Utc::now())
        .await?;

    Ok(Json(LeaderboardResponse::from_view(
        Some(period),
        view,
        limit,
    )))
}

/// Community score ranking (highest first).
async fn community_leaderboard(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<LeaderboardParams>, QueryRejection>,
) -> Result<Json<LeaderboardResponse>> {
    let (_, limit) = parse_params(params)?;

    let view = state
        .leaderboard
        .ranking(Board::Community, Utc::now())
        .await?;

    Ok(Json(LeaderboardResponse::from_view(None, view, limit)))
}
