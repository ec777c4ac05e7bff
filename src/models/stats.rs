// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! History statistics: per user for the dashboard, and across all users for
//! the public stats page.
//!
//! Computed from history on read; nothing here is stored.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::estimate::round2;
use crate::models::{Breakdown, HistoryEntry};

/// Months of trend data returned.
const TREND_MONTHS: u32 = 6;

/// Months of growth data returned by [`GlobalStats`].
const GROWTH_MONTHS: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryStats {
    pub total_calculations: u32,
    pub average_footprint: f64,
    pub lowest_footprint: f64,
    pub highest_footprint: f64,
    /// First calculation minus the latest one (positive means improvement)
    pub total_reduction: f64,
    /// Mean footprint per month ("YYYY-MM"), oldest first
    pub monthly_trend: Vec<MonthlyTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyTrend {
    pub month: String,
    pub footprint: f64,
    pub calculations: u32,
}

impl HistoryStats {
    /// Summarize entries sorted oldest first.
    pub fn from_entries(entries: &[HistoryEntry], now: DateTime<Utc>) -> Self {
        let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
            return Self::default();
        };

        let totals: Vec<f64> = entries.iter().map(HistoryEntry::monthly_total).collect();
        let sum: f64 = totals.iter().sum();
        let lowest = totals.iter().copied().fold(f64::INFINITY, f64::min);
        let highest = totals.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let trend_start = now
            .checked_sub_months(Months::new(TREND_MONTHS))
            .unwrap_or(now);

        // month key -> (sum, count)
        let mut by_month: BTreeMap<String, (f64, u32)> = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.created_at >= trend_start) {
            let slot = by_month
                .entry(month_key(entry.created_at))
                .or_insert((0.0, 0));
            slot.0 += entry.monthly_total();
            slot.1 += 1;
        }

        Self {
            total_calculations: entries.len() as u32,
            average_footprint: round2(sum / entries.len() as f64),
            lowest_footprint: round2(lowest),
            highest_footprint: round2(highest),
            total_reduction: round2(first.monthly_total() - last.monthly_total()),
            monthly_trend: by_month
                .into_iter()
                .map(|(month, (sum, count))| MonthlyTrend {
                    month,
                    footprint: round2(sum / f64::from(count)),
                    calculations: count,
                })
                .collect(),
        }
    }
}

/// Aggregates over every user's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GlobalStats {
    pub total_calculations: u32,
    pub total_users: u32,
    pub average_footprint: f64,
    /// Sum of (regional average − monthly total), floored at zero
    pub total_emissions_saved: f64,
    /// Mean of each category across all calculations
    pub category_breakdown: Breakdown,
    /// Most recent months with activity, oldest first
    pub monthly_growth: Vec<MonthlyGrowth>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyGrowth {
    pub month: String,
    pub calculations: u32,
    /// Distinct users who calculated that month
    pub users: u32,
}

impl GlobalStats {
    pub fn from_entries(entries: &[HistoryEntry], now: DateTime<Utc>) -> Self {
        if entries.is_empty() {
            return Self {
                last_updated: now,
                ..Self::default()
            };
        }

        let count = entries.len() as f64;
        let mut users = HashSet::new();
        let mut footprint = 0.0;
        let mut saved = 0.0;
        let mut categories = Breakdown::default();
        // month key -> (calculations, users)
        let mut by_month: BTreeMap<String, (u32, HashSet<&str>)> = BTreeMap::new();

        for entry in entries {
            let estimate = &entry.estimate;
            users.insert(entry.user_id.as_str());
            footprint += estimate.monthly_total;
            saved += estimate.comparison.regional_average - estimate.monthly_total;
            categories.transportation += estimate.breakdown.transportation;
            categories.energy += estimate.breakdown.energy;
            categories.food += estimate.breakdown.food;
            categories.lifestyle += estimate.breakdown.lifestyle;

            let slot = by_month.entry(month_key(entry.created_at)).or_default();
            slot.0 += 1;
            slot.1.insert(entry.user_id.as_str());
        }

        let skip = by_month.len().saturating_sub(GROWTH_MONTHS);
        Self {
            total_calculations: entries.len() as u32,
            total_users: users.len() as u32,
            average_footprint: round2(footprint / count),
            total_emissions_saved: round2(saved).max(0.0),
            category_breakdown: Breakdown {
                transportation: round2(categories.transportation / count),
                energy: round2(categories.energy / count),
                food: round2(categories.food / count),
                lifestyle: round2(categories.lifestyle / count),
            },
            monthly_growth: by_month
                .into_iter()
                .skip(skip)
                .map(|(month, (calculations, users))| MonthlyGrowth {
                    month,
                    calculations,
                    users: users.len() as u32,
                })
                .collect(),
            last_updated: now,
        }
    }
}

/// "YYYY-MM" for a timestamp.
fn month_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m").to_string()
}
