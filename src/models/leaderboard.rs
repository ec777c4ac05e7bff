// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard views (derived, never stored).

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Time window selector for the footprint leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// Start of the window ending at `now`: a rolling 7 days for a week,
    /// otherwise the start of the current UTC calendar month/year.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Week => now - Duration::days(7),
            Period::Month => Utc
                .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
                .single()
                .unwrap_or(now),
            Period::Year => Utc
                .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(now),
        }
    }
}

/// One ranked user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    /// Mean monthly footprint (period board, lower is better) or
    /// community score (higher is better)
    pub score: f64,
    /// 1-indexed position
    pub rank: u32,
    pub calculations: u32,
    pub level: u32,
    pub badge_count: u32,
    #[serde(with = "crate::time_utils::utc_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub last_calculation: DateTime<Utc>,
}

/// Aggregates over every entry in a leaderboard window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WindowStats {
    pub total_users: u32,
    pub average_footprint: f64,
    pub total_calculations: u32,
}
