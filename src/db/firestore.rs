// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles (`user_profiles/{user_id}`, versioned)
//! - History (`emission_history/{id}`, append-only)
//!
//! Timestamps are stored as fixed-width RFC 3339 strings, so string ordering
//! in queries matches time ordering.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{CalculationType, HistoryEntry, HistoryOrder, HistoryQuery, UserProfile};
use crate::time_utils::format_utc_millis;
use chrono::{DateTime, Utc};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation returns an error.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PROFILES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a profile (and optionally a new history entry) in one transaction,
    /// provided the stored version still equals `expected_version`.
    ///
    /// The version check reads outside the transaction, so two instances can
    /// still interleave between check and commit. Writes from one instance
    /// are already serialized by the caller's per-user lock.
    pub async fn commit_progress(
        &self,
        expected_version: Option<u64>,
        profile: &UserProfile,
        entry: Option<&HistoryEntry>,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let user_id = profile.user_id.as_str();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let stored_version = self.get_profile(user_id).await?.map(|p| p.version);
        if stored_version != expected_version {
            tracing::debug!(
                user_id,
                ?expected_version,
                ?stored_version,
                "Profile version mismatch"
            );
            let _ = transaction.rollback().await;
            return Err(AppError::ProfileConflict {
                user_id: user_id.to_string(),
            });
        }

        client
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(user_id)
            .object(profile)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add profile to transaction: {}", e))
            })?;

        if let Some(entry) = entry {
            client
                .fluent()
                .update()
                .in_col(collections::HISTORY)
                .document_id(&entry.id)
                .object(entry)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add history entry to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }

    // ─── History Operations ──────────────────────────────────────

    /// Get one entry, only if it belongs to `user_id`.
    pub async fn get_history_entry(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<HistoryEntry>, AppError> {
        let entry: Option<HistoryEntry> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::HISTORY)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(entry.filter(|e| e.user_id == user_id))
    }

    pub async fn query_history(
        &self,
        user_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        let user_id = user_id.to_string();
        let calculation_type = query.calculation_type;
        let direction = match query.order {
            HistoryOrder::OldestFirst => firestore::FirestoreQueryDirection::Ascending,
            HistoryOrder::NewestFirst => firestore::FirestoreQueryDirection::Descending,
        };

        let mut select = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::HISTORY)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    calculation_type.and_then(|t| q.field("calculation_type").eq(t.as_str())),
                ])
            })
            .order_by([("created_at", direction)])
            .offset(query.offset);

        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        select
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn count_history(
        &self,
        user_id: &str,
        calculation_type: Option<CalculationType>,
    ) -> Result<u32, AppError> {
        let query = HistoryQuery {
            calculation_type,
            ..HistoryQuery::all()
        };
        Ok(self.query_history(user_id, &query).await?.len() as u32)
    }

    /// Every user's entries created at or after `since`.
    pub async fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, AppError> {
        let since = format_utc_millis(since);

        self.get_client()?
            .fluent()
            .select()
            .from(collections::HISTORY)
            .filter(move |q| q.field("created_at").greater_than_or_equal(since.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an entry owned by `user_id`. Returns whether anything was removed.
    pub async fn delete_history_entry(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        if self.get_history_entry(user_id, id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::HISTORY)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }
}
