// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge catalog loading and rule evaluation.

use crate::models::badge::builtin_definitions;
use crate::models::{BadgeDefinition, CriteriaType, HistoryEntry, UserProfile};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

/// Entries considered by `sustained_footprint` badges.
const SUSTAINED_WINDOW: usize = 10;
/// Entries in the window that must pass for a `sustained_footprint` badge.
const SUSTAINED_REQUIRED: usize = 5;

/// Immutable badge catalog, shared by reference.
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    definitions: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
    /// The catalog shipped with the service.
    pub fn builtin() -> Self {
        Self {
            definitions: builtin_definitions(),
        }
    }

    /// Build a catalog, rejecting duplicate ids.
    pub fn new(definitions: Vec<BadgeDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.id.as_str()) {
                return Err(CatalogError::DuplicateId(def.id.clone()));
            }
            if !def.threshold.is_finite() {
                return Err(CatalogError::InvalidThreshold(def.id.clone()));
            }
        }
        Ok(Self { definitions })
    }

    /// Load a catalog from a JSON file holding an array of definitions.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<BadgeDefinition> = serde_json::from_str(json_data)
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;
        let catalog = Self::new(definitions)?;
        tracing::info!(count = catalog.definitions.len(), "Loaded badge catalog");
        Ok(catalog)
    }

    pub fn definitions(&self) -> &[BadgeDefinition] {
        &self.definitions
    }

    pub fn get(&self, id: &str) -> Option<&BadgeDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }
}

/// Errors from catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse badge catalog: {0}")]
    ParseError(String),

    #[error("Duplicate badge id: {0}")]
    DuplicateId(String),

    #[error("Badge {0} has a non-finite threshold")]
    InvalidThreshold(String),
}

/// Facts that come from outside the user's own profile and history.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadgeFacts {
    /// Rank-based percentile (lower is better), when a ranking is available
    pub percentile: Option<f64>,
    /// Qualifying community actions
    pub community_actions: u32,
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BadgeEvaluation {
    /// Badges whose criteria hold and that the evaluated profile lacks
    pub eligible_not_yet_earned: BTreeSet<String>,
}

impl BadgeEvaluation {
    /// Grant every eligible badge the profile still lacks, crediting coin
    /// rewards in the same step. Returns the ids actually added.
    ///
    /// Badges already present are left alone, so applying an evaluation
    /// computed against an older snapshot never double-credits.
    pub fn apply(&self, profile: &mut UserProfile, catalog: &BadgeCatalog) -> BTreeSet<String> {
        let mut newly_earned = BTreeSet::new();
        for id in &self.eligible_not_yet_earned {
            let Some(def) = catalog.get(id) else {
                continue;
            };
            if profile.badges.insert(id.clone()) {
                profile.coins = profile.coins.saturating_add(def.coin_reward);
                newly_earned.insert(id.clone());
            }
        }
        newly_earned
    }
}

/// Evaluate every catalog badge the profile does not hold yet.
///
/// `history` must be the user's entries oldest first. Criteria that lack the
/// data they need are simply not eligible.
pub fn evaluate(
    profile: &UserProfile,
    history: &[HistoryEntry],
    catalog: &BadgeCatalog,
    facts: &BadgeFacts,
) -> BadgeEvaluation {
    let eligible_not_yet_earned = catalog
        .definitions()
        .iter()
        .filter(|def| !profile.badges.contains(&def.id))
        .filter(|def| criteria_met(def, profile, history, facts))
        .map(|def| def.id.clone())
        .collect();

    BadgeEvaluation {
        eligible_not_yet_earned,
    }
}

fn criteria_met(
    def: &BadgeDefinition,
    profile: &UserProfile,
    history: &[HistoryEntry],
    facts: &BadgeFacts,
) -> bool {
    let holds = |value: f64| def.comparison.holds(value, def.threshold);

    match def.criteria_type {
        CriteriaType::CalculationCount => holds(f64::from(profile.total_calculations)),
        CriteriaType::FootprintThreshold => {
            profile.has_calculations()
                && profile.best_footprint > 0.0
                && holds(profile.best_footprint)
        }
        CriteriaType::StreakLength => holds(f64::from(profile.current_streak)),
        CriteriaType::PercentileRank => facts.percentile.is_some_and(holds),
        CriteriaType::ImprovementRatio => improvement_ratio(profile, history).is_some_and(holds),
        CriteriaType::SustainedFootprint => {
            let start = history.len().saturating_sub(SUSTAINED_WINDOW);
            let passing = history[start..]
                .iter()
                .filter(|e| holds(e.monthly_total()))
                .count();
            passing >= SUSTAINED_REQUIRED
        }
        CriteriaType::CommunityActivity => holds(f64::from(facts.community_actions)),
    }
}

/// Percent reduction of the best footprint relative to the first entry.
fn improvement_ratio(profile: &UserProfile, history: &[HistoryEntry]) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }
    let first = history.first()?.monthly_total();
    if first <= 0.0 {
        return None;
    }
    Some((first - profile.best_footprint) / first * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ActivityInput, Breakdown, Comparison, EmissionEstimate, Energy, Food, FootprintComparison,
        Lifestyle, Rarity, Transportation, FIRST_STEP,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn make_entry(monthly: f64, day: i64) -> HistoryEntry {
        let input = ActivityInput {
            calculation_type: Default::default(),
            family_size: None,
            employee_count: None,
            transportation: Transportation::default(),
            energy: Energy::default(),
            food: Food::default(),
            lifestyle: Lifestyle::default(),
        };
        let estimate = EmissionEstimate {
            daily_total: monthly / 30.0,
            monthly_total: monthly,
            yearly_total: monthly * 12.0,
            breakdown: Breakdown {
                energy: monthly,
                ..Default::default()
            },
            comparison: FootprintComparison {
                regional_average: 150.0,
                global_average: 400.0,
                percentile: 50,
            },
        };
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(day);
        HistoryEntry::new("u1", input, estimate, vec![], created)
    }

    fn make_profile(total: u32, best: f64, streak: u32) -> UserProfile {
        let mut profile = UserProfile::placeholder("u1", Utc::now());
        profile.total_calculations = total;
        profile.best_footprint = best;
        profile.average_footprint = best;
        profile.current_streak = streak;
        profile.longest_streak = streak;
        profile.badges.insert(FIRST_STEP.to_string());
        profile
    }

    fn def(
        id: &str,
        criteria_type: CriteriaType,
        threshold: f64,
        cmp: Comparison,
    ) -> BadgeDefinition {
        BadgeDefinition {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            rarity: Rarity::Common,
            criteria_type,
            threshold,
            comparison: cmp,
            coin_reward: 20,
        }
    }

    #[test]
    fn test_improvement_ratio_needs_two_entries() {
        let catalog = BadgeCatalog::builtin();
        let profile = make_profile(1, 50.0, 1);
        let history = vec![make_entry(50.0, 0)];

        let evaluation = evaluate(&profile, &history, &catalog, &BadgeFacts::default());

        assert!(!evaluation
            .eligible_not_yet_earned
            .contains("improvement-master"));
    }

    #[test]
    fn test_improvement_ratio_with_history() {
        let catalog = BadgeCatalog::builtin();
        let profile = make_profile(2, 70.0, 2);
        let history = vec![make_entry(100.0, 0), make_entry(70.0, 1)];

        let evaluation = evaluate(&profile, &history, &catalog, &BadgeFacts::default());

        // 30% below the first calculation, best under 100
        assert!(evaluation
            .eligible_not_yet_earned
            .contains("improvement-master"));
        assert!(evaluation.eligible_not_yet_earned.contains("eco-warrior"));
        assert!(!evaluation.eligible_not_yet_earned.contains(FIRST_STEP));
    }

    #[test]
    fn test_zero_first_entry_is_not_eligible() {
        let catalog = BadgeCatalog::new(vec![def(
            "ratio",
            CriteriaType::ImprovementRatio,
            0.0,
            Comparison::Gte,
        )])
        .unwrap();
        let profile = make_profile(2, 0.0, 1);
        let history = vec![make_entry(0.0, 0), make_entry(0.0, 1)];

        let evaluation = evaluate(&profile, &history, &catalog, &BadgeFacts::default());
        assert!(evaluation.eligible_not_yet_earned.is_empty());
    }

    #[test]
    fn test_footprint_threshold_requires_a_calculation() {
        let catalog = BadgeCatalog::builtin();
        let profile = UserProfile::placeholder("u1", Utc::now());

        let evaluation = evaluate(&profile, &[], &catalog, &BadgeFacts::default());
        assert!(!evaluation.eligible_not_yet_earned.contains("eco-warrior"));
    }

    #[test]
    fn test_sustained_footprint_uses_last_ten() {
        let catalog = BadgeCatalog::builtin();
        // Five early low entries followed by ten high ones
        let mut history: Vec<HistoryEntry> = (0..5).map(|d| make_entry(60.0, d)).collect();
        history.extend((5..15).map(|d| make_entry(120.0, d)));
        let profile = make_profile(15, 60.0, 1);

        let evaluation = evaluate(&profile, &history, &catalog, &BadgeFacts::default());
        assert!(!evaluation.eligible_not_yet_earned.contains("green-champion"));

        // Five of the last ten under 80
        history.extend((15..20).map(|d| make_entry(70.0, d)));
        let evaluation = evaluate(&profile, &history, &catalog, &BadgeFacts::default());
        assert!(evaluation.eligible_not_yet_earned.contains("green-champion"));
    }

    #[test]
    fn test_percentile_and_community_facts() {
        let catalog = BadgeCatalog::builtin();
        let profile = make_profile(3, 120.0, 1);
        let history = vec![make_entry(120.0, 0)];

        let without = evaluate(&profile, &history, &catalog, &BadgeFacts::default());
        assert!(!without.eligible_not_yet_earned.contains("top-25"));

        let facts = BadgeFacts {
            percentile: Some(20.0),
            community_actions: 5,
        };
        let with = evaluate(&profile, &history, &catalog, &facts);
        assert!(with.eligible_not_yet_earned.contains("top-25"));
        assert!(!with.eligible_not_yet_earned.contains("top-10"));
        assert!(with.eligible_not_yet_earned.contains("community-helper"));
    }

    #[test]
    fn test_apply_credits_coins_once() {
        let catalog = BadgeCatalog::builtin();
        let mut profile = make_profile(10, 90.0, 7);
        profile.coins = 40;
        let history = vec![make_entry(90.0, 0)];

        let evaluation = evaluate(&profile, &history, &catalog, &BadgeFacts::default());
        let newly = evaluation.apply(&mut profile, &catalog);

        let expected: BTreeSet<String> = ["data-lover", "eco-warrior", "week-streak"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(newly, expected);
        assert_eq!(profile.coins, 40 + 25 + 50 + 30);

        // Re-applying the same (now stale) evaluation changes nothing
        let again = evaluation.apply(&mut profile, &catalog);
        assert!(again.is_empty());
        assert_eq!(profile.coins, 145);
    }

    #[test]
    fn test_badges_are_never_revoked() {
        let catalog = BadgeCatalog::builtin();
        let mut profile = make_profile(10, 90.0, 7);
        let history = vec![make_entry(90.0, 0)];
        evaluate(&profile, &history, &catalog, &BadgeFacts::default())
            .apply(&mut profile, &catalog);
        let earned = profile.badges.clone();

        // Conditions stop holding: streak resets, footprint rises
        profile.current_streak = 1;
        profile.best_footprint = 500.0;
        evaluate(&profile, &history, &catalog, &BadgeFacts::default())
            .apply(&mut profile, &catalog);

        assert!(profile.badges.is_superset(&earned));
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let result = BadgeCatalog::new(vec![
            def("a", CriteriaType::StreakLength, 3.0, Comparison::Gte),
            def("a", CriteriaType::StreakLength, 4.0, Comparison::Gte),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"[
            {
                "id": "triple",
                "display_name": "Triple",
                "criteria_type": "streak_length",
                "threshold": 3,
                "comparison": "gte",
                "coin_reward": 15
            }
        ]"#;

        let catalog = BadgeCatalog::load_from_json(json).unwrap();
        let badge = catalog.get("triple").unwrap();
        assert_eq!(badge.criteria_type, CriteriaType::StreakLength);
        assert_eq!(badge.rarity, Rarity::Common);

        let profile = make_profile(3, 200.0, 3);
        let evaluation = evaluate(&profile, &[], &catalog, &BadgeFacts::default());
        assert!(evaluation.eligible_not_yet_earned.contains("triple"));
    }

    #[test]
    fn test_catalog_rejects_unknown_criteria() {
        let json = r#"[{"id": "x", "display_name": "X", "criteria_type": "karma",
                        "threshold": 1, "comparison": "gte", "coin_reward": 1}]"#;
        assert!(matches!(
            BadgeCatalog::load_from_json(json),
            Err(CatalogError::ParseError(_))
        ));
    }
}
