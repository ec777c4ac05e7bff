// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progression engine.
//!
//! [`advance`] is the pure state transition applied once per calculation.
//! [`ProgressionService`] wraps it in the write path:
//! 1. Estimate the input (pure, outside any lock)
//! 2. Acquire the per-user lock
//! 3. Read the prior profile and history
//! 4. Advance, then evaluate and apply badges
//! 5. Commit profile and history entry together, conditional on the version read in step 3
//!
//! A version conflict (another instance wrote in between) restarts from step 3
//! with fresh reads.

use crate::db::Store;
use crate::error::Result;
use crate::models::estimate::round2;
use crate::models::{
    ActivityInput, EmissionEstimate, HistoryEntry, HistoryQuery, ProfileUpdate, UserProfile,
    FIRST_STEP,
};
use crate::services::badges::{evaluate, BadgeCatalog, BadgeEvaluation, BadgeFacts};
use crate::services::estimator::estimate;
use crate::services::insights::generate_insights;
use crate::services::LeaderboardService;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

/// Coins for the very first calculation.
const FIRST_CALCULATION_COINS: u32 = 10;
/// Coins for every later calculation.
const BASE_COINS: u32 = 5;
/// Bonus for beating the personal best.
const PERSONAL_BEST_COINS: u32 = 15;
/// Streak bonus per day of the extended streak.
const STREAK_COINS_PER_DAY: u32 = 2;
/// Commit attempts before a version conflict is surfaced.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Shared per-user locks type for use in AppState.
pub type UserLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// How the streak moves between two calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// Same calendar-day window as the previous entry: streak kept, no bonus
    SameDay,
    /// Exactly one day later: streak grows, bonus paid
    Extended,
    /// More than one day, or no previous entry
    Reset,
}

impl StreakTransition {
    /// Classify by whole days elapsed since the previous entry.
    pub fn between(last_entry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last_entry else {
            return StreakTransition::Reset;
        };
        match (now - last).num_days() {
            days if days <= 0 => StreakTransition::SameDay,
            1 => StreakTransition::Extended,
            _ => StreakTransition::Reset,
        }
    }
}

/// Apply one calculation to a profile.
///
/// A missing prior, or one with no calculations yet (created by a settings
/// update), takes the first-calculation path but keeps the prior's settings.
pub fn advance(
    user_id: &str,
    prior: Option<&UserProfile>,
    estimate: &EmissionEstimate,
    last_entry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> UserProfile {
    let monthly = estimate.monthly_total;
    let mut next = prior
        .cloned()
        .unwrap_or_else(|| UserProfile::placeholder(user_id, now));
    next.updated_at = now;
    next.last_calculation_at = Some(now);

    let Some(prior) = prior.filter(|p| p.has_calculations()) else {
        next.total_calculations = 1;
        next.average_footprint = monthly;
        next.best_footprint = monthly;
        next.baseline_footprint = monthly;
        next.total_savings = 0.0;
        next.current_streak = 1;
        next.longest_streak = next.longest_streak.max(1);
        next.coins = next.coins.saturating_add(FIRST_CALCULATION_COINS);
        next.badges.insert(FIRST_STEP.to_string());
        return next;
    };

    let total = prior.total_calculations + 1;
    next.total_calculations = total;
    next.average_footprint = round2(
        (prior.average_footprint * f64::from(prior.total_calculations) + monthly)
            / f64::from(total),
    );
    next.best_footprint = prior.best_footprint.min(monthly);
    next.total_savings = round2(prior.total_savings + (prior.baseline_footprint - monthly).max(0.0));

    let transition = StreakTransition::between(last_entry, now);
    next.current_streak = match transition {
        StreakTransition::SameDay => prior.current_streak.max(1),
        StreakTransition::Extended => prior.current_streak + 1,
        StreakTransition::Reset => 1,
    };
    next.longest_streak = prior.longest_streak.max(next.current_streak);

    let mut award = BASE_COINS;
    if monthly < prior.best_footprint {
        award += PERSONAL_BEST_COINS;
    }
    if transition == StreakTransition::Extended {
        award += next.current_streak * STREAK_COINS_PER_DAY;
    }
    next.coins = prior.coins.saturating_add(award);

    next
}

/// Badges `next` holds that `prior` did not.
fn newly_added_badges(prior: Option<&UserProfile>, next: &UserProfile) -> BTreeSet<String> {
    match prior {
        Some(prior) => next.badges.difference(&prior.badges).cloned().collect(),
        None => next.badges.clone(),
    }
}

/// Outcome of a recorded calculation.
#[derive(Debug, Clone)]
pub struct CalculationOutcome {
    pub entry: HistoryEntry,
    pub profile: UserProfile,
    pub newly_earned: BTreeSet<String>,
}

/// Serialized write path for per-user progression state.
#[derive(Clone)]
pub struct ProgressionService {
    store: Store,
    catalog: Arc<BadgeCatalog>,
    leaderboard: LeaderboardService,
    /// Per-user mutex serializing read-modify-write of a profile.
    locks: UserLocks,
}

impl ProgressionService {
    pub fn new(store: Store, catalog: Arc<BadgeCatalog>, leaderboard: LeaderboardService) -> Self {
        Self {
            store,
            catalog,
            leaderboard,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Estimate, advance and evaluate badges for one submitted calculation.
    pub async fn record_calculation(
        &self,
        user_id: &str,
        input: ActivityInput,
        now: DateTime<Utc>,
    ) -> Result<CalculationOutcome> {
        input.validate()?;

        let estimate = estimate(&input);
        let insights = generate_insights(&estimate);
        // Advisory and possibly stale; read before taking the lock
        let percentile = self.leaderboard.percentile_for(user_id, now).await;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut attempt = 1;
        loop {
            let prior = self.store.get_profile(user_id).await?;
            let mut history = self.store.query_history(user_id, &HistoryQuery::all()).await?;
            let last_entry = history.last().map(|e| e.created_at);

            let mut next = advance(user_id, prior.as_ref(), &estimate, last_entry, now);
            let entry = HistoryEntry::new(
                user_id,
                input.clone(),
                estimate.clone(),
                insights.clone(),
                now,
            );
            history.push(entry.clone());

            let facts = BadgeFacts {
                percentile,
                community_actions: next.community_actions,
            };
            evaluate(&next, &history, &self.catalog, &facts).apply(&mut next, &self.catalog);
            // Includes first-step, which `advance` grants without a catalog reward
            let newly_earned = newly_added_badges(prior.as_ref(), &next);

            let expected = prior.as_ref().map(|p| p.version);
            next.version = expected.map_or(1, |v| v + 1);

            match self
                .store
                .commit_progress(expected, &next, Some(&entry))
                .await
            {
                Ok(()) => {
                    self.leaderboard.invalidate();
                    tracing::info!(
                        user_id,
                        entry_id = %entry.id,
                        monthly_total = entry.monthly_total(),
                        total_calculations = next.total_calculations,
                        coins = next.coins,
                        newly_earned = ?newly_earned,
                        "Calculation recorded"
                    );
                    return Ok(CalculationOutcome {
                        entry,
                        profile: next,
                        newly_earned,
                    });
                }
                Err(e) if e.is_conflict() && attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::warn!(user_id, attempt, "Profile version conflict, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Apply a settings update, creating the profile if needed.
    pub async fn update_settings(
        &self,
        user_id: &str,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<UserProfile> {
        update.validate()?;

        self.mutate(user_id, now, |profile| {
            update.clone().apply_to(profile);
            Ok(BTreeSet::new())
        })
        .await
        .map(|(profile, _)| profile)
    }

    /// Count one qualifying community action and re-evaluate badges.
    pub async fn record_community_action(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(UserProfile, BTreeSet<String>)> {
        let percentile = self.leaderboard.percentile_for(user_id, now).await;
        let store = self.store.clone();
        let catalog = self.catalog.clone();

        self.mutate_async(user_id, now, move |mut profile| {
            let store = store.clone();
            let catalog = catalog.clone();
            async move {
                profile.community_actions = profile.community_actions.saturating_add(1);
                let history = store
                    .query_history(&profile.user_id, &HistoryQuery::all())
                    .await?;
                let facts = BadgeFacts {
                    percentile,
                    community_actions: profile.community_actions,
                };
                let newly = evaluate(&profile, &history, &catalog, &facts)
                    .apply(&mut profile, &catalog);
                Ok((profile, newly))
            }
        })
        .await
    }

    /// Read-only badge status: the profile (or an empty placeholder) and the
    /// badges it could claim right now.
    pub async fn badge_status(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(UserProfile, BadgeEvaluation)> {
        let all = HistoryQuery::all();
        let (profile, history, percentile) = tokio::join!(
            self.store.get_profile(user_id),
            self.store.query_history(user_id, &all),
            self.leaderboard.percentile_for(user_id, now)
        );
        let profile = profile?.unwrap_or_else(|| UserProfile::placeholder(user_id, now));
        let history = history?;

        let facts = BadgeFacts {
            percentile,
            community_actions: profile.community_actions,
        };
        let evaluation = evaluate(&profile, &history, &self.catalog, &facts);
        Ok((profile, evaluation))
    }

    /// Synchronous read-modify-write of one profile.
    async fn mutate<F>(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        change: F,
    ) -> Result<(UserProfile, BTreeSet<String>)>
    where
        F: Fn(&mut UserProfile) -> Result<BTreeSet<String>>,
    {
        self.mutate_async(user_id, now, |mut profile| {
            let result = change(&mut profile).map(|newly| (profile, newly));
            async move { result }
        })
        .await
    }

    /// Locked, version-checked read-modify-write of one profile. `change`
    /// may run more than once when a conflicting write is detected.
    async fn mutate_async<F, Fut>(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        change: F,
    ) -> Result<(UserProfile, BTreeSet<String>)>
    where
        F: Fn(UserProfile) -> Fut,
        Fut: std::future::Future<Output = Result<(UserProfile, BTreeSet<String>)>>,
    {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut attempt = 1;
        loop {
            let prior = self.store.get_profile(user_id).await?;
            let expected = prior.as_ref().map(|p| p.version);
            let current = prior.unwrap_or_else(|| UserProfile::placeholder(user_id, now));

            let (mut next, newly) = change(current).await?;
            next.updated_at = now;
            next.version = expected.map_or(1, |v| v + 1);

            match self.store.commit_progress(expected, &next, None).await {
                Ok(()) => {
                    self.leaderboard.invalidate();
                    return Ok((next, newly));
                }
                Err(e) if e.is_conflict() && attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::warn!(user_id, attempt, "Profile version conflict, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read the profile, or a placeholder for users with no state yet.
    pub async fn profile_or_placeholder(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile> {
        Ok(self
            .store
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::placeholder(user_id, now)))
    }
}
