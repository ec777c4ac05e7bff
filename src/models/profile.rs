// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user progression state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Coins needed per level.
pub const COINS_PER_LEVEL: u32 = 100;

/// Level reached with a given coin balance.
pub fn level_for_coins(coins: u32) -> u32 {
    coins / COINS_PER_LEVEL + 1
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Preferences {
    #[serde(default)]
    pub units: Units,
    #[serde(default = "default_true")]
    pub notifications: bool,
    /// Appear on public leaderboards
    #[serde(default = "default_true")]
    pub public_profile: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            units: Units::Metric,
            notifications: true,
            public_profile: true,
        }
    }
}

/// Progression state for one user.
///
/// Stored at: `user_profiles/{user_id}`
///
/// `version` increases by one on every write; stores reject a write whose
/// expected version is stale. The level is not stored: see [`UserProfile::level`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,

    // ─── Footprint Aggregates ────────────────────────────────────
    #[serde(default)]
    pub total_calculations: u32,
    /// Running mean of monthly totals
    #[serde(default)]
    pub average_footprint: f64,
    /// Lowest monthly total so far
    #[serde(default)]
    pub best_footprint: f64,
    /// Monthly total of the first calculation
    #[serde(default)]
    pub baseline_footprint: f64,
    /// Σ max(0, baseline − monthly) over later calculations
    #[serde(default)]
    pub total_savings: f64,

    // ─── Gamification ────────────────────────────────────────────
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub coins: u32,
    #[serde(default)]
    pub badges: BTreeSet<String>,
    /// Qualifying community actions reported by other services
    #[serde(default)]
    pub community_actions: u32,

    // ─── Settings ────────────────────────────────────────────────
    #[serde(default)]
    pub monthly_goal: Option<f64>,
    #[serde(default)]
    pub preferences: Preferences,

    // ─── Metadata ────────────────────────────────────────────────
    #[serde(default, with = "crate::time_utils::utc_millis::option")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub last_calculation_at: Option<DateTime<Utc>>,
    #[serde(with = "crate::time_utils::utc_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::time_utils::utc_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub version: u64,
}

impl UserProfile {
    /// A profile with no calculations yet (never persisted by reads).
    pub fn placeholder(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: None,
            total_calculations: 0,
            average_footprint: 0.0,
            best_footprint: 0.0,
            baseline_footprint: 0.0,
            total_savings: 0.0,
            current_streak: 0,
            longest_streak: 0,
            coins: 0,
            badges: BTreeSet::new(),
            community_actions: 0,
            monthly_goal: None,
            preferences: Preferences::default(),
            last_calculation_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Level derived from the coin balance.
    pub fn level(&self) -> u32 {
        level_for_coins(self.coins)
    }

    pub fn has_calculations(&self) -> bool {
        self.total_calculations > 0
    }

    pub fn display_name_or_default(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| "Anonymous".to_string())
    }
}

/// User-editable profile settings; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 64))]
    pub display_name: Option<String>,
    #[validate(range(min = 0.0, max = 1_000_000.0))]
    pub monthly_goal: Option<f64>,
    pub preferences: Option<Preferences>,
}

impl ProfileUpdate {
    pub fn apply_to(self, profile: &mut UserProfile) {
        if let Some(name) = self.display_name {
            profile.display_name = Some(name.trim().to_string());
        }
        if let Some(goal) = self.monthly_goal {
            profile.monthly_goal = Some(goal);
        }
        if let Some(preferences) = self.preferences {
            profile.preferences = preferences;
        }
    }
}
