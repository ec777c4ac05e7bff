// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard aggregation.
//!
//! Rankings are derived on demand from profiles and history:
//! - period boards rank by mean monthly footprint inside a time window
//!   (ascending, lower is better)
//! - the community board ranks by a gamification score (descending)
//!
//! Users who opted out of public ranking are removed before scoring, so they
//! never shift anyone else's position. Ties go to the user whose last
//! calculation came first.
//!
//! [`LeaderboardService`] bounds each scan with a timeout and keeps the last
//! full ranking per board, which it serves flagged as stale when a fresh scan
//! does not finish in time. Local writes call [`LeaderboardService::invalidate`];
//! the TTL only bounds how long writes from other instances go unseen.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::estimate::round2;
use crate::models::{
    GlobalStats, HistoryEntry, LeaderboardEntry, Period, UserProfile, WindowStats,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{self, AtomicU64};
use std::sync::Arc;
use std::time::Duration;

const SAVINGS_WEIGHT: f64 = 0.1;
const STREAK_WEIGHT: f64 = 10.0;
const BADGE_WEIGHT: f64 = 50.0;

/// Community score for one profile (rounded to a whole number).
pub fn community_score(profile: &UserProfile) -> f64 {
    (profile.total_savings * SAVINGS_WEIGHT
        + f64::from(profile.current_streak) * STREAK_WEIGHT
        + profile.badges.len() as f64 * BADGE_WEIGHT)
        .round()
}

/// Full ranking for one board plus its window aggregates.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub entries: Vec<LeaderboardEntry>,
    pub stats: WindowStats,
}

impl Ranking {
    /// Rank-based percentile of a user (lower is better).
    pub fn percentile_of(&self, user_id: &str) -> Option<f64> {
        let entry = self.entries.iter().find(|e| e.user_id == user_id)?;
        Some(f64::from(entry.rank) / self.entries.len() as f64 * 100.0)
    }

    pub fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }
}

/// Rank users by mean monthly footprint over entries in `[window_start, now]`.
pub fn rank_by_window(
    profiles: &[UserProfile],
    history: &[HistoryEntry],
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    window_ranking(profiles, history, window_start, now).top(limit)
}

/// Untruncated window ranking with aggregates.
pub fn window_ranking(
    profiles: &[UserProfile],
    history: &[HistoryEntry],
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Ranking {
    let by_id: HashMap<&str, &UserProfile> =
        profiles.iter().map(|p| (p.user_id.as_str(), p)).collect();
    let opted_out: HashSet<&str> = profiles
        .iter()
        .filter(|p| !p.preferences.public_profile)
        .map(|p| p.user_id.as_str())
        .collect();

    struct Window {
        sum: f64,
        count: u32,
        last: DateTime<Utc>,
    }

    let mut windows: HashMap<&str, Window> = HashMap::new();
    for entry in history
        .iter()
        .filter(|e| e.created_at >= window_start && e.created_at <= now)
        .filter(|e| !opted_out.contains(e.user_id.as_str()))
    {
        let window = windows.entry(entry.user_id.as_str()).or_insert(Window {
            sum: 0.0,
            count: 0,
            last: entry.created_at,
        });
        window.sum += entry.monthly_total();
        window.count += 1;
        window.last = window.last.max(entry.created_at);
    }

    let total_calculations: u32 = windows.values().map(|w| w.count).sum();
    let total_footprint: f64 = windows.values().map(|w| w.sum).sum();
    let stats = WindowStats {
        total_users: windows.len() as u32,
        average_footprint: if total_calculations > 0 {
            round2(total_footprint / f64::from(total_calculations))
        } else {
            0.0
        },
        total_calculations,
    };

    let entries = windows
        .into_iter()
        .map(|(user_id, window)| {
            let profile = by_id.get(user_id).copied();
            make_entry(
                user_id,
                profile,
                round2(window.sum / f64::from(window.count)),
                window.count,
                window.last,
            )
        })
        .collect();

    Ranking {
        entries: sort_and_rank(entries, Ordering::Less),
        stats,
    }
}

/// Rank users with at least one calculation by community score.
pub fn rank_by_score(profiles: &[UserProfile], limit: usize) -> Vec<LeaderboardEntry> {
    score_ranking(profiles).top(limit)
}

pub fn score_ranking(profiles: &[UserProfile]) -> Ranking {
    let ranked: Vec<&UserProfile> = profiles
        .iter()
        .filter(|p| p.preferences.public_profile && p.has_calculations())
        .collect();

    let stats = WindowStats {
        total_users: ranked.len() as u32,
        average_footprint: mean(ranked.iter().map(|p| p.average_footprint)),
        total_calculations: ranked.iter().map(|p| p.total_calculations).sum(),
    };

    let entries = ranked
        .into_iter()
        .map(|p| {
            make_entry(
                &p.user_id,
                Some(p),
                community_score(p),
                p.total_calculations,
                p.last_calculation_at.unwrap_or(p.updated_at),
            )
        })
        .collect();

    Ranking {
        entries: sort_and_rank(entries, Ordering::Greater),
        stats,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        round2(sum / f64::from(count))
    }
}

fn make_entry(
    user_id: &str,
    profile: Option<&UserProfile>,
    score: f64,
    calculations: u32,
    last_calculation: DateTime<Utc>,
) -> LeaderboardEntry {
    LeaderboardEntry {
        user_id: user_id.to_string(),
        display_name: profile
            .map(UserProfile::display_name_or_default)
            .unwrap_or_else(|| "Anonymous".to_string()),
        score,
        rank: 0,
        calculations,
        level: profile.map_or(1, UserProfile::level),
        badge_count: profile.map_or(0, |p| p.badges.len() as u32),
        last_calculation,
    }
}

/// Sort so that entries whose score compares as `better` against another come
/// first, break ties by earliest last calculation then user id, and assign
/// 1-indexed ranks.
fn sort_and_rank(mut entries: Vec<LeaderboardEntry>, better: Ordering) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        let by_score = a.score.total_cmp(&b.score);
        let by_score = if better == Ordering::Less {
            by_score
        } else {
            by_score.reverse()
        };
        by_score
            .then(a.last_calculation.cmp(&b.last_calculation))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i as u32 + 1;
    }
    entries
}

/// Which board a cached ranking belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
    Period(Period),
    Community,
}

#[derive(Debug, Clone)]
struct CachedRanking {
    ranking: Arc<Ranking>,
    computed_at: DateTime<Utc>,
    /// Cache generation the scan started in
    generation: u64,
}

/// A ranking as served to callers.
#[derive(Debug, Clone)]
pub struct RankingView {
    pub ranking: Arc<Ranking>,
    pub computed_at: DateTime<Utc>,
    /// Served from cache after a fresh scan timed out
    pub stale: bool,
}

type RankingCache = Arc<DashMap<Board, CachedRanking>>;

/// Time-bounded, cached leaderboard queries.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Store,
    timeout: Duration,
    cache_ttl: Duration,
    cache: RankingCache,
    generation: Arc<AtomicU64>,
}

impl LeaderboardService {
    pub fn new(store: Store, timeout: Duration, cache_ttl: Duration) -> Self {
        Self {
            store,
            timeout,
            cache_ttl,
            cache: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Ranking for `board`, recomputed when the cached copy is older than the
    /// TTL or a write has landed since it was scanned.
    pub async fn ranking(&self, board: Board, now: DateTime<Utc>) -> Result<RankingView> {
        let generation = self.generation.load(atomic::Ordering::Acquire);
        let cached = self.cache.get(&board).map(|c| c.clone());

        if let Some(cached) = &cached {
            let age = (now - cached.computed_at).to_std().unwrap_or_default();
            if cached.generation == generation && age < self.cache_ttl {
                return Ok(RankingView {
                    ranking: cached.ranking.clone(),
                    computed_at: cached.computed_at,
                    stale: false,
                });
            }
        }

        match tokio::time::timeout(self.timeout, self.compute(board, now)).await {
            Ok(Ok(ranking)) => {
                let ranking = Arc::new(ranking);
                self.cache.insert(
                    board,
                    CachedRanking {
                        ranking: ranking.clone(),
                        computed_at: now,
                        generation,
                    },
                );
                Ok(RankingView {
                    ranking,
                    computed_at: now,
                    stale: false,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                let budget_ms = self.timeout.as_millis() as u64;
                match cached {
                    Some(cached) => {
                        tracing::warn!(
                            ?board,
                            budget_ms,
                            computed_at = %cached.computed_at,
                            "Leaderboard scan timed out, serving cached ranking"
                        );
                        Ok(RankingView {
                            ranking: cached.ranking,
                            computed_at: cached.computed_at,
                            stale: true,
                        })
                    }
                    None => {
                        tracing::warn!(?board, budget_ms, "Leaderboard scan timed out");
                        Err(AppError::AggregationTimeout { budget_ms })
                    }
                }
            }
        }
    }

    /// The user's percentile in this month's footprint ranking.
    ///
    /// Advisory: may be stale, and any failure yields `None`.
    pub async fn percentile_for(&self, user_id: &str, now: DateTime<Utc>) -> Option<f64> {
        match self.ranking(Board::Period(Period::Month), now).await {
            Ok(view) => view.ranking.percentile_of(user_id),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Percentile unavailable");
                None
            }
        }
    }

    /// Mark every cached ranking out of date.
    ///
    /// Old rankings stay available as the stale fallback for timed-out scans.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, atomic::Ordering::AcqRel);
    }

    /// Aggregates over all history, bounded by the same timeout as rankings.
    pub async fn global_stats(&self, now: DateTime<Utc>) -> Result<GlobalStats> {
        let scan = self.store.history_since(DateTime::<Utc>::default());
        match tokio::time::timeout(self.timeout, scan).await {
            Ok(history) => {
                let history = history?;
                tracing::debug!(entries = history.len(), "Computed global stats");
                Ok(GlobalStats::from_entries(&history, now))
            }
            Err(_) => {
                let budget_ms = self.timeout.as_millis() as u64;
                tracing::warn!(budget_ms, "Global stats scan timed out");
                Err(AppError::AggregationTimeout { budget_ms })
            }
        }
    }

    async fn compute(&self, board: Board, now: DateTime<Utc>) -> Result<Ranking> {
        match board {
            Board::Period(period) => {
                let window_start = period.window_start(now);
                let (profiles, history) = futures_util::try_join!(
                    self.store.list_profiles(),
                    self.store.history_since(window_start)
                )?;
                tracing::debug!(
                    ?period,
                    profiles = profiles.len(),
                    entries = history.len(),
                    "Computed window ranking"
                );
                Ok(window_ranking(&profiles, &history, window_start, now))
            }
            Board::Community => {
                let profiles = self.store.list_profiles().await?;
                Ok(score_ranking(&profiles))
            }
        }
    }
}
