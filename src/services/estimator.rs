// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emission formula engine.
//!
//! Pure and total: every validated [`ActivityInput`] maps to an estimate.
//! Each category is floored at zero on its own before the household
//! multiplier is applied, so mitigations in one category never offset
//! emissions in another.

use crate::models::activity::{CarType, Energy, Food, HomeSize, Lifestyle, Transportation};
use crate::models::estimate::round2;
use crate::models::{ActivityInput, Breakdown, EmissionEstimate, FootprintComparison};

const DAYS_PER_MONTH: f64 = 30.0;
const WEEKS_PER_MONTH: f64 = 4.33;
const MONTHS_PER_YEAR: f64 = 12.0;
const MEALS_PER_WEEK: f64 = 21.0;
const KM_PER_MILE: f64 = 1.60934;

/// Fuel factor (kg CO₂ per unit of fuel) and efficiency (km per unit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fuel {
    pub kg_per_unit: f64,
    pub km_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportFactors {
    pub petrol: Fuel,
    pub diesel: Fuel,
    pub electric: Fuel,
    pub hybrid: Fuel,
    pub two_wheeler: Fuel,
    pub public_transport_per_km: f64,
    pub flight_per_km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyFactors {
    pub grid_per_kwh: f64,
    pub lpg_per_kg: f64,
    pub small_home: f64,
    pub medium_home: f64,
    pub large_home: f64,
    pub renewable_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoodFactors {
    pub meat_meal: f64,
    pub vegetarian_meal: f64,
    pub local_multiplier: f64,
    pub organic_multiplier: f64,
    pub waste_per_kg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifestyleFactors {
    pub shopping_per_unit: f64,
    pub recycling_multiplier: f64,
}

/// Emission factor table (kg CO₂) plus reference averages (kg CO₂/month).
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFactors {
    pub transport: TransportFactors,
    pub energy: EnergyFactors,
    pub food: FoodFactors,
    pub lifestyle: LifestyleFactors,
    pub regional_average: f64,
    pub global_average: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            transport: TransportFactors {
                petrol: Fuel {
                    kg_per_unit: 2.31,
                    km_per_unit: 15.0,
                },
                diesel: Fuel {
                    kg_per_unit: 2.68,
                    km_per_unit: 18.0,
                },
                electric: Fuel {
                    kg_per_unit: 0.82,
                    km_per_unit: 5.0,
                },
                hybrid: Fuel {
                    kg_per_unit: 1.85,
                    km_per_unit: 20.0,
                },
                two_wheeler: Fuel {
                    kg_per_unit: 1.2,
                    km_per_unit: 40.0,
                },
                public_transport_per_km: 0.089,
                flight_per_km: 0.255,
            },
            energy: EnergyFactors {
                grid_per_kwh: 0.82,
                lpg_per_kg: 2.75,
                small_home: 1.0,
                medium_home: 1.3,
                large_home: 1.8,
                renewable_multiplier: 0.3,
            },
            food: FoodFactors {
                meat_meal: 6.61,
                vegetarian_meal: 1.5,
                local_multiplier: 0.8,
                organic_multiplier: 0.9,
                waste_per_kg: 3.3,
            },
            lifestyle: LifestyleFactors {
                shopping_per_unit: 0.0005,
                recycling_multiplier: 0.7,
            },
            regional_average: 150.0,
            global_average: 400.0,
        }
    }
}

impl EmissionFactors {
    /// Estimate emissions for one activity input.
    pub fn estimate(&self, input: &ActivityInput) -> EmissionEstimate {
        let multiplier = input.multiplier();
        let scaled = |raw_monthly: f64| round2(raw_monthly.max(0.0) * multiplier);

        let breakdown = Breakdown {
            transportation: scaled(self.transport_monthly(&input.transportation)),
            energy: scaled(self.energy_monthly(&input.energy)),
            food: scaled(self.food_monthly(&input.food)),
            lifestyle: scaled(self.lifestyle_monthly(&input.lifestyle)),
        };

        let monthly_total = round2(breakdown.sum());
        let percentile = if self.regional_average > 0.0 {
            (monthly_total / self.regional_average * 50.0)
                .round()
                .clamp(5.0, 95.0) as u8
        } else {
            95
        };

        EmissionEstimate {
            daily_total: round2(monthly_total / DAYS_PER_MONTH),
            monthly_total,
            yearly_total: round2(monthly_total * MONTHS_PER_YEAR),
            breakdown,
            comparison: FootprintComparison {
                regional_average: self.regional_average,
                global_average: self.global_average,
                percentile,
            },
        }
    }

    fn transport_monthly(&self, t: &Transportation) -> f64 {
        let f = &self.transport;

        let car_fuel = match t.car_type {
            CarType::Petrol => f.petrol,
            CarType::Diesel => f.diesel,
            CarType::Electric => f.electric,
            CarType::Hybrid => f.hybrid,
        };
        let car_km = t.car_miles_per_day * KM_PER_MILE * DAYS_PER_MONTH;
        let two_wheeler_km = t.two_wheeler_km_per_day * DAYS_PER_MONTH;

        fuel_emissions(car_km, car_fuel)
            + t.public_transport_km_per_day * f.public_transport_per_km * DAYS_PER_MONTH
            + t.flight_km_per_month * f.flight_per_km
            + fuel_emissions(two_wheeler_km, f.two_wheeler)
    }

    fn energy_monthly(&self, e: &Energy) -> f64 {
        let f = &self.energy;
        let home = match e.home_size {
            HomeSize::Small => f.small_home,
            HomeSize::Medium => f.medium_home,
            HomeSize::Large => f.large_home,
        };
        let renewable = if e.renewable {
            f.renewable_multiplier
        } else {
            1.0
        };

        (e.electricity_kwh * f.grid_per_kwh + e.gas_kg * f.lpg_per_kg) * home * renewable
    }

    fn food_monthly(&self, food: &Food) -> f64 {
        let f = &self.food;
        let meat_meals = food.meat_meals_per_week.min(MEALS_PER_WEEK);
        let vegetarian_meals = MEALS_PER_WEEK - meat_meals;

        let mut diet = (meat_meals * f.meat_meal + vegetarian_meals * f.vegetarian_meal)
            * WEEKS_PER_MONTH;
        if food.local_food {
            diet *= f.local_multiplier;
        }
        if food.organic_food {
            diet *= f.organic_multiplier;
        }

        diet + food.food_waste_kg_per_week * f.waste_per_kg * WEEKS_PER_MONTH
    }

    fn lifestyle_monthly(&self, l: &Lifestyle) -> f64 {
        let f = &self.lifestyle;
        let recycling = if l.recycling {
            f.recycling_multiplier
        } else {
            1.0
        };
        let waste_reduction = 1.0 - l.waste_reduction_percent / 100.0;

        l.shopping_spend * f.shopping_per_unit * recycling * waste_reduction
    }
}

fn fuel_emissions(km: f64, fuel: Fuel) -> f64 {
    if km <= 0.0 || fuel.km_per_unit <= 0.0 {
        return 0.0;
    }
    km / fuel.km_per_unit * fuel.kg_per_unit
}

/// Estimate with the default factor table.
pub fn estimate(input: &ActivityInput) -> EmissionEstimate {
    EmissionFactors::default().estimate(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CalculationType;

    fn empty_input() -> ActivityInput {
        ActivityInput {
            calculation_type: CalculationType::Individual,
            family_size: None,
            employee_count: None,
            transportation: Transportation::default(),
            energy: Energy::default(),
            food: Food::default(),
            lifestyle: Lifestyle::default(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.011
    }

    #[test]
    fn test_vegetarian_baseline() {
        // No meat: 21 vegetarian meals a week
        let estimate = estimate(&empty_input());
        assert!(close(estimate.breakdown.food, 21.0 * 1.5 * 4.33));
        assert_eq!(estimate.breakdown.transportation, 0.0);
        assert_eq!(estimate.breakdown.energy, 0.0);
        assert_eq!(estimate.breakdown.lifestyle, 0.0);
    }

    #[test]
    fn test_car_and_transit() {
        let mut input = empty_input();
        input.transportation.car_miles_per_day = 10.0;
        input.transportation.car_type = CarType::Diesel;
        input.transportation.public_transport_km_per_day = 5.0;
        input.transportation.flight_km_per_month = 100.0;

        let expected =
            10.0 * 1.60934 * 30.0 / 18.0 * 2.68 + 5.0 * 0.089 * 30.0 + 100.0 * 0.255;
        let estimate = estimate(&input);
        assert!(close(estimate.breakdown.transportation, expected));
    }

    #[test]
    fn test_energy_mitigations() {
        let mut input = empty_input();
        input.energy.electricity_kwh = 100.0;
        input.energy.home_size = HomeSize::Large;
        let full = estimate(&input).breakdown.energy;

        input.energy.renewable = true;
        let renewable = estimate(&input).breakdown.energy;

        assert!(close(full, 100.0 * 0.82 * 1.8));
        assert!(close(renewable, full * 0.3));
    }

    #[test]
    fn test_lifestyle_full_waste_reduction_is_zero() {
        let mut input = empty_input();
        input.lifestyle.shopping_spend = 10_000.0;
        input.lifestyle.recycling = true;
        input.lifestyle.waste_reduction_percent = 100.0;

        assert_eq!(estimate(&input).breakdown.lifestyle, 0.0);
    }

    #[test]
    fn test_multiplier_scales_every_category() {
        let mut input = empty_input();
        input.energy.electricity_kwh = 50.0;
        let single = estimate(&input);

        input.calculation_type = CalculationType::Family;
        input.family_size = Some(3);
        let family = estimate(&input);

        assert!(close(family.breakdown.energy, single.breakdown.energy * 3.0));
        assert!(close(family.breakdown.food, single.breakdown.food * 3.0));
    }

    #[test]
    fn test_breakdown_sums_to_monthly_total() {
        let mut input = empty_input();
        input.transportation.car_miles_per_day = 7.3;
        input.transportation.two_wheeler_km_per_day = 11.1;
        input.energy.gas_kg = 14.2;
        input.food.meat_meals_per_week = 5.0;
        input.food.food_waste_kg_per_week = 1.7;
        input.lifestyle.shopping_spend = 4321.0;

        let estimate = estimate(&input);
        assert_eq!(round2(estimate.breakdown.sum()), estimate.monthly_total);
        assert_eq!(estimate.yearly_total, round2(estimate.monthly_total * 12.0));
        assert_eq!(estimate.daily_total, round2(estimate.monthly_total / 30.0));
    }

    #[test]
    fn test_percentile_is_clamped() {
        let low = estimate(&empty_input());
        // ~136 kg of vegetarian food alone
        assert_eq!(
            low.comparison.percentile,
            (low.monthly_total / 150.0 * 50.0).round() as u8
        );

        let mut huge = empty_input();
        huge.transportation.flight_km_per_month = 100_000.0;
        assert_eq!(estimate(&huge).comparison.percentile, 95);

        let factors = EmissionFactors {
            food: FoodFactors {
                vegetarian_meal: 0.0,
                ..EmissionFactors::default().food
            },
            ..EmissionFactors::default()
        };
        assert_eq!(factors.estimate(&empty_input()).comparison.percentile, 5);
    }

    #[test]
    fn test_negative_category_is_floored_independently() {
        // A factor table with a negative (offsetting) lifestyle coefficient
        let factors = EmissionFactors {
            lifestyle: LifestyleFactors {
                shopping_per_unit: -1.0,
                recycling_multiplier: 1.0,
            },
            ..EmissionFactors::default()
        };
        let mut input = empty_input();
        input.lifestyle.shopping_spend = 1_000.0;

        let estimate = factors.estimate(&input);
        assert_eq!(estimate.breakdown.lifestyle, 0.0);
        assert!(estimate.breakdown.food > 0.0);
        assert_eq!(round2(estimate.breakdown.sum()), estimate.monthly_total);
    }
}
