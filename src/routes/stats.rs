// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public aggregate statistics.

use crate::error::Result;
use crate::models::GlobalStats;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/stats", get(global_stats))
}

/// Totals, category averages and monthly growth across all users.
async fn global_stats(State(state): State<Arc<AppState>>) -> Result<Json<GlobalStats>> {
    let stats = state.leaderboard.global_stats(Utc::now()).await?;
    Ok(Json(stats))
}
