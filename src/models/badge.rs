// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge catalog entries.
//!
//! Criteria types and comparisons are matched by their string tags, so the
//! serialized names below are part of the catalog file format.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Badge granted with the first calculation.
pub const FIRST_STEP: &str = "first-step";

/// What fact a badge threshold is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaType {
    CalculationCount,
    FootprintThreshold,
    StreakLength,
    PercentileRank,
    ImprovementRatio,
    SustainedFootprint,
    CommunityActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    /// Whether `value <op> threshold` holds.
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Lt => value < threshold,
            Comparison::Lte => value <= threshold,
            Comparison::Gt => value > threshold,
            Comparison::Gte => value >= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BadgeDefinition {
    /// Stable identifier stored in `UserProfile::badges`
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rarity: Rarity,
    pub criteria_type: CriteriaType,
    pub threshold: f64,
    pub comparison: Comparison,
    pub coin_reward: u32,
}

impl BadgeDefinition {
    #[allow(clippy::too_many_arguments)]
    fn builtin(
        id: &str,
        display_name: &str,
        description: &str,
        rarity: Rarity,
        criteria_type: CriteriaType,
        threshold: f64,
        comparison: Comparison,
        coin_reward: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            rarity,
            criteria_type,
            threshold,
            comparison,
            coin_reward,
        }
    }
}

/// The catalog shipped with the service.
pub fn builtin_definitions() -> Vec<BadgeDefinition> {
    use Comparison::*;
    use CriteriaType::*;

    vec![
        BadgeDefinition::builtin(
            FIRST_STEP,
            "🌱 First Step",
            "Complete your first carbon footprint calculation",
            Rarity::Common,
            CalculationCount,
            1.0,
            Gte,
            10,
        ),
        BadgeDefinition::builtin(
            "eco-warrior",
            "🌟 Eco Warrior",
            "Achieve a footprint below 100 kg CO₂/month",
            Rarity::Rare,
            FootprintThreshold,
            100.0,
            Lt,
            50,
        ),
        BadgeDefinition::builtin(
            "week-streak",
            "🔥 Week Streak",
            "Calculate your footprint for 7 consecutive days",
            Rarity::Rare,
            StreakLength,
            7.0,
            Gte,
            30,
        ),
        BadgeDefinition::builtin(
            "month-streak",
            "🔥 Month Streak",
            "Calculate your footprint for 30 consecutive days",
            Rarity::Epic,
            StreakLength,
            30.0,
            Gte,
            100,
        ),
        BadgeDefinition::builtin(
            "data-lover",
            "📊 Data Lover",
            "Complete 10 carbon footprint calculations",
            Rarity::Common,
            CalculationCount,
            10.0,
            Gte,
            25,
        ),
        BadgeDefinition::builtin(
            "top-25",
            "🏆 Top 25%",
            "Rank in the top 25% of users",
            Rarity::Epic,
            PercentileRank,
            25.0,
            Lte,
            75,
        ),
        BadgeDefinition::builtin(
            "top-10",
            "🏆 Top 10%",
            "Rank in the top 10% of users",
            Rarity::Legendary,
            PercentileRank,
            10.0,
            Lte,
            150,
        ),
        BadgeDefinition::builtin(
            "improvement-master",
            "📈 Improvement Master",
            "Reduce your footprint by 20% from your first calculation",
            Rarity::Epic,
            ImprovementRatio,
            20.0,
            Gte,
            100,
        ),
        BadgeDefinition::builtin(
            "green-champion",
            "🌿 Green Champion",
            "Stay below 80 kg CO₂/month in at least 5 of your last 10 calculations",
            Rarity::Legendary,
            SustainedFootprint,
            80.0,
            Lt,
            200,
        ),
        BadgeDefinition::builtin(
            "community-helper",
            "🤝 Community Helper",
            "Help others by sharing tips in the community",
            Rarity::Rare,
            CommunityActivity,
            5.0,
            Gte,
            40,
        ),
    ]
}
