// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Store`] is the keyed record store behind the progression engine, backed
//! either by Firestore or by an in-process map. Profile writes are
//! conditional on the version the writer read; a mismatch surfaces as
//! [`AppError::ProfileConflict`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use crate::models::{CalculationType, HistoryEntry, HistoryQuery, UserProfile};
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    /// Progression state (keyed by user_id)
    pub const PROFILES: &str = "user_profiles";
    /// Calculation history (keyed by entry id)
    pub const HISTORY: &str = "emission_history";
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Firestore(FirestoreDb),
}

impl Store {
    /// Open the backend selected by the configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.storage_backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory store");
                Ok(Store::Memory(MemoryStore::new()))
            }
            StorageBackend::Firestore => Ok(Store::Firestore(
                FirestoreDb::new(&config.gcp_project_id).await?,
            )),
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        match self {
            Store::Memory(db) => db.get_profile(user_id).await,
            Store::Firestore(db) => db.get_profile(user_id).await,
        }
    }

    /// Every stored profile (full scan).
    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        match self {
            Store::Memory(db) => db.list_profiles().await,
            Store::Firestore(db) => db.list_profiles().await,
        }
    }

    /// Write `profile`, plus `entry` if given, all or nothing.
    ///
    /// `expected_version` is the version the caller read (`None` if the
    /// profile did not exist).
    pub async fn commit_progress(
        &self,
        expected_version: Option<u64>,
        profile: &UserProfile,
        entry: Option<&HistoryEntry>,
    ) -> Result<(), AppError> {
        match self {
            Store::Memory(db) => db.commit_progress(expected_version, profile, entry).await,
            Store::Firestore(db) => db.commit_progress(expected_version, profile, entry).await,
        }
    }

    pub async fn get_history_entry(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<HistoryEntry>, AppError> {
        match self {
            Store::Memory(db) => db.get_history_entry(user_id, id).await,
            Store::Firestore(db) => db.get_history_entry(user_id, id).await,
        }
    }

    pub async fn query_history(
        &self,
        user_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        match self {
            Store::Memory(db) => db.query_history(user_id, query).await,
            Store::Firestore(db) => db.query_history(user_id, query).await,
        }
    }

    pub async fn count_history(
        &self,
        user_id: &str,
        calculation_type: Option<CalculationType>,
    ) -> Result<u32, AppError> {
        match self {
            Store::Memory(db) => db.count_history(user_id, calculation_type).await,
            Store::Firestore(db) => db.count_history(user_id, calculation_type).await,
        }
    }

    /// Entries from all users created at or after `since` (full scan).
    pub async fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, AppError> {
        match self {
            Store::Memory(db) => db.history_since(since).await,
            Store::Firestore(db) => db.history_since(since).await,
        }
    }

    /// Idempotent owner-scoped delete; returns whether an entry was removed.
    pub async fn delete_history_entry(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        match self {
            Store::Memory(db) => db.delete_history_entry(user_id, id).await,
            Store::Firestore(db) => db.delete_history_entry(user_id, id).await,
        }
    }
}
