// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod badges;
pub mod estimator;
pub mod insights;
pub mod leaderboard;
pub mod progression;

pub use badges::{BadgeCatalog, BadgeEvaluation, BadgeFacts, CatalogError};
pub use estimator::EmissionFactors;
pub use leaderboard::{Board, LeaderboardService, Ranking, RankingView};
pub use progression::{CalculationOutcome, ProgressionService};
