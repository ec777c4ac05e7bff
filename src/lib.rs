// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Footprint-Tracker: carbon footprint estimates with gamified progression
//!
//! This crate provides the backend API that turns self-reported activity
//! data into emission estimates, tracks per-user streaks, coins, levels and
//! badges, and ranks users on leaderboards.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{BadgeCatalog, LeaderboardService, ProgressionService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub catalog: Arc<BadgeCatalog>,
    pub progression: ProgressionService,
    pub leaderboard: LeaderboardService,
}

impl AppState {
    /// Wire services over an opened store.
    pub fn new(config: Config, store: Store, catalog: BadgeCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let leaderboard = LeaderboardService::new(
            store.clone(),
            config.leaderboard_timeout,
            config.leaderboard_cache_ttl,
        );
        let progression =
            ProgressionService::new(store.clone(), catalog.clone(), leaderboard.clone());

        Self {
            config,
            store,
            catalog,
            progression,
            leaderboard,
        }
    }
}
