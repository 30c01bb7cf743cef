//! Feature extraction for relocation scoring.
//!
//! Provides pure functions for computing features used in scoring:
//! - Great-circle distance (haversine)
//! - Household target AQI ceiling
//! - Per-city sub-scores (air, health fit, distance, affordability, culture)
//! - Estimated life-years gain

use airhaven_model::{CityRecord, FamilyDetails, RentRange, TargetAqiRange};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Ceiling used when nothing about the household calls for a stricter one.
pub const BASELINE_AQI_CEILING: u32 = 100;

/// Affordability when the user gives no budget.
pub const NEUTRAL_AFFORDABILITY: f64 = 80.0;

/// Great-circle distance between two coordinates, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two catalogue cities, rounded to the nearest kilometre.
pub fn distance_km(from: &CityRecord, to: &CityRecord) -> u32 {
    haversine_km(from.latitude, from.longitude, to.latitude, to.longitude).round() as u32
}

/// Derive the household's acceptable AQI ceiling.
///
/// Each rule can only lower the ceiling, so adding a child, an elderly
/// member or a condition never raises it.
pub fn target_aqi_range(family: &FamilyDetails) -> TargetAqiRange {
    let rules: [(bool, u32); 5] = [
        (family.has_conditions(), 50),
        (family.has_severe_condition(), 40),
        (family.has_children(), 60),
        (family.has_elderly(), 55),
        (
            family.has_children() && family.has_elderly() && family.has_conditions(),
            45,
        ),
    ];

    let max = rules
        .iter()
        .filter(|(applies, _)| *applies)
        .fold(BASELINE_AQI_CEILING, |ceiling, (_, candidate)| ceiling.min(*candidate));

    TargetAqiRange::up_to(max)
}

/// Health fit of a city's air for this household, 0-100.
pub fn health_score(city_aqi: u32, target: &TargetAqiRange, family: &FamilyDetails) -> u32 {
    let aqi = city_aqi as f64;
    let ceiling = target.max as f64;
    let mut score = 100.0;

    if aqi > ceiling {
        score -= (aqi - ceiling) * 1.5;
    } else {
        score += (ceiling - aqi) * 0.5;
    }

    // Vulnerable groups take an extra hit once the air is outright poor
    if city_aqi > 100 {
        if family.has_children() {
            score -= 15.0;
        }
        if family.has_elderly() {
            score -= 20.0;
        }
        score -= family.condition_count() as f64 * 10.0;
    }

    score.round().clamp(0.0, 100.0) as u32
}

/// Percentage AQI reduction from `current` to `candidate`.
pub fn aqi_improvement_pct(current: u32, candidate: u32) -> f64 {
    if current == 0 {
        return 0.0;
    }
    (current as f64 - candidate as f64) / current as f64 * 100.0
}

/// Air improvement sub-score. Capped at 100 but not floored.
pub fn aqi_score(current: u32, candidate: u32) -> f64 {
    (aqi_improvement_pct(current, candidate) * 2.0).min(100.0)
}

/// Proximity sub-score: 100 next door, 50 at the edge of the radius.
pub fn distance_score(distance_km: u32, max_distance_km: f64) -> f64 {
    if max_distance_km <= 0.0 {
        return if distance_km == 0 { 100.0 } else { 0.0 };
    }
    (100.0 - (distance_km as f64 / max_distance_km) * 50.0).max(0.0)
}

/// Rent affordability sub-score, 20-100.
pub fn affordability_score(budget: Option<f64>, rent: &RentRange) -> f64 {
    let Some(budget) = budget else {
        return NEUTRAL_AFFORDABILITY;
    };

    let rent_min = rent.min as f64;
    if rent_min <= budget {
        if rent_min <= 0.0 {
            return 100.0;
        }
        (budget / rent_min * 60.0 + 40.0).min(100.0)
    } else if budget <= 0.0 {
        20.0
    } else {
        (60.0 - (rent_min - budget) / budget * 100.0).max(20.0)
    }
}

/// Cultural fit from the food compatibility score.
pub fn cultural_score(food_compatibility: u32) -> u32 {
    ((food_compatibility as f64 + 80.0) / 2.0).round() as u32
}

/// Rough life expectancy gain, in years, from moving between two AQIs.
pub fn life_years_gain(current: u32, candidate: u32, family: &FamilyDetails) -> f64 {
    let mut gain = (current as f64 - candidate as f64) / 10.0 * 0.3;

    if family.has_elderly() {
        gain *= 1.2;
    }
    if family.has_children() {
        gain *= 1.15;
    }
    if family.has_conditions() {
        gain *= 1.0 + family.condition_count() as f64 * 0.1;
    }

    (gain * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use airhaven_model::{FamilyType, HealthCondition};

    fn delhi() -> CityRecord {
        CityRecord::new("Delhi", "Delhi", 28.6139, 77.2090, 285)
    }

    fn mumbai() -> CityRecord {
        CityRecord::new("Mumbai", "Maharashtra", 19.0760, 72.8777, 145)
    }

    fn family(children: u32, elderly: u32, conditions: &[HealthCondition]) -> FamilyDetails {
        let mut family = FamilyDetails::new(FamilyType::Joint, 6)
            .with_children(children)
            .with_elderly(elderly);
        for c in conditions {
            family = family.with_condition(*c);
        }
        family
    }

    #[test]
    fn test_distance_known_pair() {
        let d = distance_km(&delhi(), &mumbai());
        assert!((1145..=1151).contains(&d), "Delhi-Mumbai was {d} km");
    }

    #[test]
    fn test_distance_symmetry() {
        assert_eq!(distance_km(&delhi(), &mumbai()), distance_km(&mumbai(), &delhi()));
        assert_eq!(distance_km(&delhi(), &delhi()), 0);
    }

    #[test]
    fn test_haversine_nyc_london() {
        let d = haversine_km(40.7128, -74.0060, 51.5074, -0.1278);
        assert!((d - 5570.0).abs() < 50.0);
    }

    #[test]
    fn test_threshold_rules() {
        assert_eq!(target_aqi_range(&family(0, 0, &[])).max, 100);
        assert_eq!(target_aqi_range(&family(1, 0, &[])).max, 60);
        assert_eq!(target_aqi_range(&family(0, 1, &[])).max, 55);
        assert_eq!(target_aqi_range(&family(0, 0, &[HealthCondition::Allergies])).max, 50);
        assert_eq!(target_aqi_range(&family(0, 0, &[HealthCondition::Asthma])).max, 40);
        assert_eq!(target_aqi_range(&family(1, 1, &[HealthCondition::Allergies])).max, 45);
        assert_eq!(target_aqi_range(&family(1, 1, &[HealthCondition::Copd])).max, 40);
        assert_eq!(target_aqi_range(&family(1, 0, &[])).min, 0);
    }

    #[test]
    fn test_threshold_monotonic() {
        let conditions = [
            vec![],
            vec![HealthCondition::Allergies],
            vec![HealthCondition::Allergies, HealthCondition::Asthma],
        ];
        for children in 0..3 {
            for elderly in 0..3 {
                for (i, conds) in conditions.iter().enumerate() {
                    let base = target_aqi_range(&family(children, elderly, conds)).max;
                    assert!(base <= 100);
                    assert!(target_aqi_range(&family(children + 1, elderly, conds)).max <= base);
                    assert!(target_aqi_range(&family(children, elderly + 1, conds)).max <= base);
                    if let Some(more) = conditions.get(i + 1) {
                        assert!(target_aqi_range(&family(children, elderly, more)).max <= base);
                    }
                }
            }
        }
    }

    #[test]
    fn test_health_score() {
        let target = TargetAqiRange::up_to(60);
        let kids = family(1, 0, &[]);
        // Under target: bonus, capped at 100
        assert_eq!(health_score(42, &target, &kids), 100);
        // Over target: 100 - 25 * 1.5
        assert_eq!(health_score(85, &target, &kids), 63);
        // Over 100 with a child: 100 - 65 * 1.5 - 15 = -12.5 -> 0
        assert_eq!(health_score(125, &target, &kids), 0);

        let loose = TargetAqiRange::up_to(100);
        let vulnerable = family(1, 1, &[HealthCondition::Allergies, HealthCondition::Bronchitis]);
        // 100 - 15 - 15 - 20 - 20
        assert_eq!(health_score(110, &loose, &vulnerable), 30);
    }

    #[test]
    fn test_aqi_score_caps_at_100() {
        assert_eq!(aqi_score(285, 42), 100.0);
        assert!((aqi_score(100, 80) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_score_bounds() {
        assert_eq!(distance_score(0, 500.0), 100.0);
        assert_eq!(distance_score(500, 500.0), 50.0);
        assert_eq!(distance_score(5000, 500.0), 0.0);
        assert_eq!(distance_score(0, 0.0), 100.0);
    }

    #[test]
    fn test_affordability_score() {
        let rent = RentRange::new(15000, 40000);
        assert_eq!(affordability_score(None, &rent), 80.0);
        assert_eq!(affordability_score(Some(15000.0), &rent), 100.0);
        assert_eq!(affordability_score(Some(30000.0), &rent), 100.0);
        // 60 - (5000 / 10000) * 100 = 10 -> floor 20
        assert_eq!(affordability_score(Some(10000.0), &rent), 20.0);
        // 60 - (1500 / 13500) * 100 = 48.9
        assert!((affordability_score(Some(13500.0), &rent) - 48.888).abs() < 0.01);
        assert_eq!(affordability_score(Some(0.0), &rent), 20.0);
        assert_eq!(affordability_score(Some(0.0), &RentRange::new(0, 0)), 100.0);
    }

    #[test]
    fn test_cultural_score() {
        assert_eq!(cultural_score(95), 88);
        assert_eq!(cultural_score(70), 75);
    }

    #[test]
    fn test_life_years_gain() {
        // (285 - 42) / 10 * 0.3 = 7.29 * 1.15 = 8.38
        assert_eq!(life_years_gain(285, 42, &family(1, 0, &[])), 8.4);
        assert_eq!(life_years_gain(285, 42, &family(0, 0, &[])), 7.3);
        // 7.29 * 1.2 * 1.15 * 1.2 = 12.07
        let everyone = family(2, 1, &[HealthCondition::Asthma, HealthCondition::Copd]);
        assert_eq!(life_years_gain(285, 42, &everyone), 12.1);
    }
}
