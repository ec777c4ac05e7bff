// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emissions estimate produced by the formula engine.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Emission category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Transportation,
    Energy,
    Food,
    Lifestyle,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Transportation,
        Category::Energy,
        Category::Food,
        Category::Lifestyle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Transportation => "transportation",
            Category::Energy => "energy",
            Category::Food => "food",
            Category::Lifestyle => "lifestyle",
        }
    }
}

/// Per-category monthly kg CO₂.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Breakdown {
    pub transportation: f64,
    pub energy: f64,
    pub food: f64,
    pub lifestyle: f64,
}

impl Breakdown {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Transportation => self.transportation,
            Category::Energy => self.energy,
            Category::Food => self.food,
            Category::Lifestyle => self.lifestyle,
        }
    }

    pub fn sum(&self) -> f64 {
        self.transportation + self.energy + self.food + self.lifestyle
    }

    /// Category with the largest share; earlier categories win ties.
    pub fn highest(&self) -> Category {
        Category::ALL
            .into_iter()
            .fold(Category::Transportation, |best, c| {
                if self.get(c) > self.get(best) {
                    c
                } else {
                    best
                }
            })
    }
}

/// Reference averages and the percentile proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FootprintComparison {
    /// Regional per-person average (kg CO₂/month)
    pub regional_average: f64,
    /// Global per-person average (kg CO₂/month)
    pub global_average: f64,
    /// Linear proxy in [5, 95]; lower is better
    pub percentile: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EmissionEstimate {
    pub daily_total: f64,
    pub monthly_total: f64,
    pub yearly_total: f64,
    pub breakdown: Breakdown,
    pub comparison: FootprintComparison,
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
