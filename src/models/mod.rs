// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod activity;
pub mod badge;
pub mod estimate;
pub mod history;
pub mod leaderboard;
pub mod profile;
pub mod stats;

pub use activity::{
    ActivityInput, CalculationType, CarType, Energy, Food, HomeSize, Lifestyle, Transportation,
};
pub use badge::{BadgeDefinition, Comparison, CriteriaType, Rarity, FIRST_STEP};
pub use estimate::{Breakdown, Category, EmissionEstimate, FootprintComparison};
pub use history::{HistoryEntry, HistoryOrder, HistoryQuery};
pub use leaderboard::{LeaderboardEntry, Period, WindowStats};
pub use profile::{Preferences, ProfileUpdate, Units, UserProfile};
pub use stats::{GlobalStats, HistoryStats, MonthlyGrowth};
