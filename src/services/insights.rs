// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Human-readable insights derived from an estimate.

use crate::models::{Category, EmissionEstimate};

/// Transportation emissions above this trigger the transit tip.
const TRANSPORT_TIP_THRESHOLD: f64 = 50.0;
/// Energy emissions above this trigger the solar heating tip.
const ENERGY_TIP_THRESHOLD: f64 = 40.0;

/// Three insights: the biggest source, a comparison against the regional
/// average and one actionable tip.
pub fn generate_insights(estimate: &EmissionEstimate) -> Vec<String> {
    let breakdown = &estimate.breakdown;
    let regional = estimate.comparison.regional_average;

    let source = match breakdown.highest() {
        Category::Transportation => {
            "🚗 Transportation is your biggest emission source. Consider using public transport or carpooling."
        }
        Category::Energy => {
            "⚡ Energy consumption is your main concern. Switch to LED bulbs and energy-efficient appliances."
        }
        Category::Food => {
            "🥗 Food choices significantly impact your footprint. Try reducing meat consumption by 1-2 meals per week."
        }
        Category::Lifestyle => {
            "🛍️ Lifestyle choices are your main emission driver. Consider buying less and choosing sustainable products."
        }
    };

    let comparison = if estimate.monthly_total < regional * 0.8 {
        "🌟 Excellent! Your footprint is 20% below the regional average. You're making a real difference!"
    } else if estimate.monthly_total > regional * 1.2 {
        "📈 Your footprint is above the regional average. Small changes can make a big impact!"
    } else {
        "📊 You're close to the regional average. A few tweaks can help you do even better!"
    };

    let tip = if breakdown.transportation > TRANSPORT_TIP_THRESHOLD {
        "🚌 Try using public transport for 2 days a week - it could save 20kg CO₂ monthly!"
    } else if breakdown.energy > ENERGY_TIP_THRESHOLD {
        "💡 Switching to solar water heating could reduce your emissions by 15kg CO₂ monthly!"
    } else {
        "🌱 Small daily actions like using a reusable water bottle can save 5kg CO₂ monthly!"
    };

    vec![source.to_string(), comparison.to_string(), tip.to_string()]
}

/// Three improvement tips aimed at the highest category.
pub fn improvement_tips(estimate: &EmissionEstimate) -> Vec<String> {
    let tips: [&str; 3] = match estimate.breakdown.highest() {
        Category::Transportation => [
            "🚌 Use buses or metro for 2-3 days per week to cut fuel costs",
            "🚲 Cycle or walk for trips under 3 km - zero emissions and good exercise",
            "🚗 Carpool with colleagues or use ride-sharing to split costs and emissions",
        ],
        Category::Energy => [
            "💡 Replace all bulbs with LEDs to lower your electricity bill",
            "🌡️ Set air conditioning to 24°C instead of 18°C",
            "☀️ Use a solar water heater or solar cooker on sunny days",
        ],
        Category::Food => [
            "🥗 Try 'Meatless Monday' - one less meat meal a week saves about 25 kg CO₂ a year",
            "🛒 Buy from local farmers markets for fresher food and lower transport emissions",
            "🍽️ Plan meals ahead to reduce food waste",
        ],
        Category::Lifestyle => [
            "🛍️ Buy only what you need and cut impulse purchases",
            "♻️ Segregate waste and compost kitchen scraps at home",
            "🌱 Choose products with minimal packaging or buy in bulk",
        ],
    };

    tips.iter().map(|tip| tip.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Breakdown, FootprintComparison};

    fn make_estimate(breakdown: Breakdown) -> EmissionEstimate {
        let monthly = breakdown.sum();
        EmissionEstimate {
            daily_total: monthly / 30.0,
            monthly_total: monthly,
            yearly_total: monthly * 12.0,
            breakdown,
            comparison: FootprintComparison {
                regional_average: 150.0,
                global_average: 400.0,
                percentile: 50,
            },
        }
    }

    #[test]
    fn test_transport_heavy_estimate() {
        let insights = generate_insights(&make_estimate(Breakdown {
            transportation: 300.0,
            energy: 10.0,
            food: 20.0,
            lifestyle: 1.0,
        }));

        assert_eq!(insights.len(), 3);
        assert!(insights[0].contains("Transportation"));
        assert!(insights[1].contains("above the regional average"));
        assert!(insights[2].contains("public transport"));
    }

    #[test]
    fn test_low_footprint_is_praised() {
        let insights = generate_insights(&make_estimate(Breakdown {
            transportation: 0.0,
            energy: 45.0,
            food: 30.0,
            lifestyle: 0.0,
        }));

        assert!(insights[0].contains("Energy"));
        assert!(insights[1].starts_with("🌟"));
        assert!(insights[2].contains("solar"));
    }

    #[test]
    fn test_near_average_uses_generic_tip() {
        let insights = generate_insights(&make_estimate(Breakdown {
            transportation: 10.0,
            energy: 20.0,
            food: 120.0,
            lifestyle: 5.0,
        }));

        assert!(insights[0].contains("Food"));
        assert!(insights[1].contains("close to"));
        assert!(insights[2].contains("reusable"));
    }

    #[test]
    fn test_improvement_tips_follow_highest_category() {
        let tips = improvement_tips(&make_estimate(Breakdown {
            lifestyle: 80.0,
            ..Default::default()
        }));

        assert_eq!(tips.len(), 3);
        assert!(tips[1].contains("compost"));
    }
}
