// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Self-reported activity input for one emissions calculation.
//!
//! Numeric fields inside a category block default to zero when omitted;
//! the four blocks themselves are required.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Default household size for family calculations.
pub const DEFAULT_FAMILY_SIZE: u32 = 4;
/// Default head count for organization calculations.
pub const DEFAULT_EMPLOYEE_COUNT: u32 = 50;

/// Whose emissions a calculation describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    #[default]
    Individual,
    Family,
    #[serde(alias = "company")]
    Organization,
}

impl CalculationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationType::Individual => "individual",
            CalculationType::Family => "family",
            CalculationType::Organization => "organization",
        }
    }
}

impl std::str::FromStr for CalculationType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "individual" => Ok(CalculationType::Individual),
            "family" => Ok(CalculationType::Family),
            "organization" | "company" => Ok(CalculationType::Organization),
            other => Err(format!("unknown calculation type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum CarType {
    #[default]
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum HomeSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Complete input for one calculation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityInput {
    #[serde(default)]
    pub calculation_type: CalculationType,
    /// Household members (family calculations)
    #[serde(default)]
    #[validate(range(min = 1, max = 1000))]
    pub family_size: Option<u32>,
    /// Head count (organization calculations)
    #[serde(default)]
    #[validate(range(min = 1, max = 1_000_000))]
    pub employee_count: Option<u32>,
    #[validate(nested)]
    pub transportation: Transportation,
    #[validate(nested)]
    pub energy: Energy,
    #[validate(nested)]
    pub food: Food,
    #[validate(nested)]
    pub lifestyle: Lifestyle,
}

impl ActivityInput {
    /// Scale factor applied to every category for household/organization inputs.
    pub fn multiplier(&self) -> f64 {
        let count = match self.calculation_type {
            CalculationType::Individual => 1,
            CalculationType::Family => self.family_size.unwrap_or(DEFAULT_FAMILY_SIZE),
            CalculationType::Organization => {
                self.employee_count.unwrap_or(DEFAULT_EMPLOYEE_COUNT)
            }
        };
        f64::from(count)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct Transportation {
    #[validate(range(min = 0.0, max = 10_000.0))]
    pub car_miles_per_day: f64,
    pub car_type: CarType,
    #[validate(range(min = 0.0, max = 10_000.0))]
    pub public_transport_km_per_day: f64,
    #[validate(range(min = 0.0, max = 1_000_000.0))]
    pub flight_km_per_month: f64,
    #[validate(range(min = 0.0, max = 10_000.0))]
    pub two_wheeler_km_per_day: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct Energy {
    /// kWh per month
    #[validate(range(min = 0.0, max = 1_000_000.0))]
    pub electricity_kwh: f64,
    /// kg of LPG per month
    #[validate(range(min = 0.0, max = 100_000.0))]
    pub gas_kg: f64,
    pub renewable: bool,
    pub home_size: HomeSize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct Food {
    #[validate(range(min = 0.0, max = 21.0))]
    pub meat_meals_per_week: f64,
    pub local_food: bool,
    pub organic_food: bool,
    #[validate(range(min = 0.0, max = 10_000.0))]
    pub food_waste_kg_per_week: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct Lifestyle {
    /// Spend in currency units per month
    #[validate(range(min = 0.0, max = 100_000_000.0))]
    pub shopping_spend: f64,
    pub recycling: bool,
    #[validate(range(min = 0.0, max = 100.0))]
    pub waste_reduction_percent: f64,
}
