// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for local runs and tests.
//!
//! One map slot per user holds the profile and that user's history, so a
//! version check and the write it guards happen under the same shard lock.

use crate::error::AppError;
use crate::models::{CalculationType, HistoryEntry, HistoryQuery, UserProfile};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct UserRecord {
    profile: Option<UserProfile>,
    /// Oldest first
    history: Vec<HistoryEntry>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, UserRecord>>,
    /// Artificial latency added to full scans, in milliseconds
    scan_delay_ms: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slow down full scans, for exercising aggregation timeouts. Applies to
    /// every clone of this store.
    pub fn set_scan_delay(&self, delay: Duration) {
        self.scan_delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    async fn simulate_scan(&self) {
        let delay_ms = self.scan_delay_ms.load(Ordering::Relaxed);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.get(user_id).and_then(|r| r.profile.clone()))
    }

    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        self.simulate_scan().await;
        Ok(self
            .users
            .iter()
            .filter_map(|r| r.profile.clone())
            .collect())
    }

    pub async fn commit_progress(
        &self,
        expected_version: Option<u64>,
        profile: &UserProfile,
        entry: Option<&HistoryEntry>,
    ) -> Result<(), AppError> {
        let mut record = self.users.entry(profile.user_id.clone()).or_default();

        let stored_version = record.profile.as_ref().map(|p| p.version);
        if stored_version != expected_version {
            return Err(AppError::ProfileConflict {
                user_id: profile.user_id.clone(),
            });
        }

        record.profile = Some(profile.clone());
        if let Some(entry) = entry {
            // Keep oldest-first order even if clocks disagree
            let at = record
                .history
                .partition_point(|e| e.created_at <= entry.created_at);
            record.history.insert(at, entry.clone());
        }
        Ok(())
    }

    pub async fn get_history_entry(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<HistoryEntry>, AppError> {
        Ok(self
            .users
            .get(user_id)
            .and_then(|r| r.history.iter().find(|e| e.id == id).cloned()))
    }

    pub async fn query_history(
        &self,
        user_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(self
            .users
            .get(user_id)
            .map(|r| query.apply(r.history.iter().cloned()))
            .unwrap_or_default())
    }

    pub async fn count_history(
        &self,
        user_id: &str,
        calculation_type: Option<CalculationType>,
    ) -> Result<u32, AppError> {
        Ok(self.users.get(user_id).map_or(0, |r| {
            r.history
                .iter()
                .filter(|e| calculation_type.is_none_or(|t| e.calculation_type == t))
                .count() as u32
        }))
    }

    pub async fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, AppError> {
        self.simulate_scan().await;
        Ok(self
            .users
            .iter()
            .flat_map(|r| {
                r.history
                    .iter()
                    .filter(|e| e.created_at >= since)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    pub async fn delete_history_entry(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        let Some(mut record) = self.users.get_mut(user_id) else {
            return Ok(false);
        };
        let before = record.history.len();
        record.history.retain(|e| e.id != id);
        Ok(record.history.len() != before)
    }
}
