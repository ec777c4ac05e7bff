// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Append-only calculation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{ActivityInput, CalculationType, EmissionEstimate};

/// Stored calculation record.
///
/// Stored at: `emission_history/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryEntry {
    /// Entry ID (also used as document ID)
    pub id: String,
    /// Owner
    pub user_id: String,
    pub calculation_type: CalculationType,
    pub input: ActivityInput,
    pub estimate: EmissionEstimate,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(with = "crate::time_utils::utc_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        user_id: &str,
        input: ActivityInput,
        estimate: EmissionEstimate,
        insights: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            calculation_type: input.calculation_type,
            input,
            estimate,
            insights,
            created_at,
        }
    }

    pub fn monthly_total(&self) -> f64 {
        self.estimate.monthly_total
    }
}

/// Result ordering for history queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

/// Filters for listing one user's history.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub calculation_type: Option<CalculationType>,
    pub order: HistoryOrder,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl HistoryQuery {
    /// Every entry, oldest first.
    pub fn all() -> Self {
        Self::default()
    }

    /// The most recent entry only.
    pub fn latest() -> Self {
        Self {
            order: HistoryOrder::NewestFirst,
            limit: Some(1),
            ..Self::default()
        }
    }

    /// Apply type filter, ordering and pagination to entries sorted oldest first.
    pub fn apply(&self, sorted: impl Iterator<Item = HistoryEntry>) -> Vec<HistoryEntry> {
        let filtered = sorted.filter(|e| {
            self.calculation_type
                .is_none_or(|t| e.calculation_type == t)
        });

        let mut entries: Vec<HistoryEntry> = filtered.collect();
        if self.order == HistoryOrder::NewestFirst {
            entries.reverse();
        }

        let limit = self.limit.map_or(usize::MAX, |l| l as usize);
        entries
            .into_iter()
            .skip(self.offset as usize)
            .take(limit)
            .collect()
    }
}
