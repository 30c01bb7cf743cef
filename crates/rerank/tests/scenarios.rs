//! End-to-end report scenarios over the bundled catalogue.

use airhaven_catalogue::{CityCatalogue, StaticCatalogue};
use airhaven_explain::no_results_verdict;
use airhaven_model::{
    AqiCategory, FamilyDetails, FamilyType, HealthCondition, MigrationReport, TargetAqiRange,
    UserProfile,
};
use airhaven_rerank::{EngineConfig, EngineError, ReportEngine};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn engine() -> ReportEngine<StaticCatalogue> {
    ReportEngine::new(StaticCatalogue::builtin().unwrap(), EngineConfig::default())
}

fn delhi_family() -> UserProfile {
    UserProfile::new("Asha", "Delhi", "IT/Software", 2500.0)
        .with_age(36)
        .with_family(FamilyDetails::new(FamilyType::Nuclear, 4).with_children(1))
}

fn names(report: &MigrationReport) -> Vec<&str> {
    report.recommendations.iter().map(|r| r.name.as_str()).collect()
}

fn assert_report_invariants(report: &MigrationReport) {
    assert!(report.recommendations.len() <= 5);
    for rec in &report.recommendations {
        assert!(rec.distance_km as f64 <= report.profile.max_distance_km);
        assert!(rec.average_aqi < report.current_city_aqi);
        assert!(!rec.name.eq_ignore_ascii_case(&report.profile.current_city));
        assert_eq!(rec.aqi_category, AqiCategory::from_aqi(rec.average_aqi));
        assert!(rec.health_score <= 100);
    }
    for pair in report.recommendations.windows(2) {
        assert!(pair[0].suitability_score >= pair[1].suitability_score);
    }
}

#[test]
fn delhi_nuclear_family_with_child() {
    let report = engine().generate_seeded(&delhi_family(), 42).unwrap();

    assert_eq!(report.current_city_aqi, 285);
    assert_eq!(report.target_aqi, TargetAqiRange { min: 0, max: 60 });
    assert_eq!(names(&report), vec!["Goa", "Kochi", "Shimla", "Coimbatore", "Mangalore"]);

    let shimla = report
        .recommendations
        .iter()
        .find(|r| r.name == "Shimla")
        .unwrap();
    assert_eq!(shimla.average_aqi, 42);
    assert_eq!(shimla.aqi_category, AqiCategory::Good);
    assert_eq!(shimla.suitability_score, 86);
    assert!((270..=285).contains(&shimla.distance_km));

    assert_eq!(report.aqi_risk_reduction, 82);
    assert_eq!(report.overall_readiness_score, 85);
    assert_eq!(report.estimated_life_years_gain, 8.3);
    assert!(report.verdict.starts_with("Top Recommendation: Goa, Goa\n\n"));
    assert!(report.verdict.contains("For your nuclear family with 1 child"));
    assert_report_invariants(&report);
}

#[test]
fn bangalore_scores_for_it_professional() {
    let engine = engine();
    let profile = delhi_family();
    let catalogue = engine.catalogue();
    let delhi = catalogue.find_city("Delhi").unwrap();
    let bangalore = catalogue.find_city("Bangalore").unwrap();
    let target = TargetAqiRange::up_to(60);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let rec = engine
        .score_city(bangalore, delhi, &target, &profile, &mut rng)
        .unwrap();
    assert_eq!(rec.aqi_category, AqiCategory::Moderate);
    assert_eq!(rec.profession_score, 95);
    assert_eq!(rec.health_score, 63);
    assert_eq!(rec.suitability_score, 81);
    assert_eq!(rec.cultural_score, 88);
}

#[test]
fn single_with_asthma_uses_strict_target() {
    let profile = UserProfile::new("Ravi", "Delhi", "IT/Software", 2500.0).with_family(
        FamilyDetails::new(FamilyType::Single, 1).with_condition(HealthCondition::Asthma),
    );
    let engine = engine();
    let report = engine.generate_seeded(&profile, 42).unwrap();

    assert_eq!(report.target_aqi.max, 40);
    assert_eq!(engine.config().weights.health_weight(&profile.family), 0.40);
    assert_eq!(report.top_pick().map(|r| r.name.as_str()), Some("Shimla"));
    assert_eq!(report.estimated_life_years_gain, 8.0);
    assert!(report
        .verdict
        .contains("and health conditions (1 respiratory concerns reported)"));
    assert_report_invariants(&report);
}

#[test]
fn cleanest_city_has_nowhere_to_go() {
    let profile = UserProfile::new("Meera", "Shimla", "Remote Work", 2500.0);
    let report = engine().generate_seeded(&profile, 42).unwrap();

    assert!(report.recommendations.is_empty());
    assert_eq!(report.aqi_risk_reduction, 0);
    assert_eq!(report.overall_readiness_score, 0);
    assert_eq!(report.estimated_life_years_gain, 0.0);
    assert_eq!(report.verdict, no_results_verdict(&profile));
    assert!(report.verdict.contains("within 2500km of Shimla"));
}

#[test]
fn unknown_current_city_fails() {
    let profile = UserProfile::new("Meera", "Atlantis", "Other", 500.0);
    assert_eq!(
        engine().generate_seeded(&profile, 1).unwrap_err(),
        EngineError::UnknownCurrentCity {
            city: "Atlantis".to_string()
        }
    );
}

#[test]
fn mumbai_budget_and_radius() {
    let profile = UserProfile::new("Kiran", "MUMBAI", "Finance/Banking", 500.0)
        .with_budget(20000.0)
        .with_family(
            FamilyDetails::new(FamilyType::Couple, 2)
                .with_elderly(1)
                .with_condition(HealthCondition::Copd),
        );
    let report = engine().generate_seeded(&profile, 5).unwrap();

    assert_eq!(report.target_aqi.max, 40);
    assert_eq!(names(&report), vec!["Goa", "Pune", "Ahmedabad"]);
    assert_report_invariants(&report);
}

#[test]
fn invariants_hold_across_catalogue() {
    let engine = engine();
    let households = [
        FamilyDetails::new(FamilyType::Single, 1),
        FamilyDetails::new(FamilyType::Nuclear, 4).with_children(2),
        FamilyDetails::new(FamilyType::Joint, 7)
            .with_children(1)
            .with_elderly(2)
            .with_condition(HealthCondition::HeartDisease),
    ];

    for city in engine.catalogue().cities() {
        for radius in [100.0, 800.0, 2500.0] {
            for family in &households {
                let profile = UserProfile::new("Any", city.name.to_uppercase(), "Healthcare", radius)
                    .with_budget(15000.0)
                    .with_family(family.clone());
                let report = engine.generate_seeded(&profile, 11).unwrap();
                assert_report_invariants(&report);
            }
        }
    }
}

#[test]
fn seeded_reports_are_reproducible() {
    let engine = engine();
    let first = engine.generate_seeded(&delhi_family(), 2024).unwrap();
    let second = engine.generate_seeded(&delhi_family(), 2024).unwrap();
    assert_eq!(first.recommendations, second.recommendations);
    assert_eq!(first.verdict, second.verdict);

    for rec in &first.recommendations {
        assert!(rec.moderate_aqi + 5 >= rec.average_aqi);
        assert!(rec.moderate_aqi <= rec.average_aqi + 9);
        assert!(rec.moderate_aqi >= 20);
    }
}

#[test]
fn noise_can_be_disabled() {
    let engine = ReportEngine::new(
        StaticCatalogue::builtin().unwrap(),
        EngineConfig {
            reading_noise: false,
            ..Default::default()
        },
    );
    let report = engine.generate_seeded(&delhi_family(), 1).unwrap();
    assert!(report
        .recommendations
        .iter()
        .all(|r| r.moderate_aqi == r.average_aqi));
}
