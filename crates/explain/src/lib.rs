//! Narrative generation for relocation reports.
//!
//! Converts a ranked recommendation list into the advisory text shown to
//! the household, plus short per-city explanations for listings. Nothing
//! here touches scoring; it only formats values already computed.

use airhaven_features::aqi_improvement_pct;
use airhaven_model::{
    CityRecommendation, FamilyDetails, FamilyType, MigrationReport, TargetAqiRange, UserProfile,
};
use serde::{Deserialize, Serialize};

/// Second key benefit when the top city lists fewer than two highlights.
pub const FALLBACK_SECOND_HIGHLIGHT: &str = "Growing opportunities";

/// First key benefit when the top city lists no highlights at all.
pub const FALLBACK_FIRST_HIGHLIGHT: &str = "Cleaner air than your current city";

/// Caveat when the top city lists no risks.
pub const FALLBACK_RISK: &str = "Research local specifics before relocating";

type FamilyPredicate = fn(&FamilyDetails) -> bool;

/// Extra health-benefit bullets, in display order.
const HEALTH_BENEFIT_RULES: &[(FamilyPredicate, &str)] = &[
    (
        FamilyDetails::has_children,
        "Children's lung development will benefit from cleaner air",
    ),
    (
        FamilyDetails::has_elderly,
        "Reduced respiratory stress for elderly family members",
    ),
    (
        FamilyDetails::has_conditions,
        "Lower risk of health condition flare-ups",
    ),
];

fn children_and_elderly(family: &FamilyDetails) -> bool {
    family.has_children() && family.has_elderly()
}

/// Family suitability paragraph: predicate, heading, body. First match wins;
/// `{city}` is replaced with the top pick.
const SUITABILITY_RULES: &[(FamilyPredicate, &str, &str)] = &[
    (
        children_and_elderly,
        "Family Suitability",
        "{city} is suitable for families with both children and elderly members. \
         The city offers healthcare facilities and child-friendly infrastructure.",
    ),
    (
        FamilyDetails::has_children,
        "Child-Friendly Environment",
        "{city} provides good educational facilities and recreational options for children.",
    ),
    (
        FamilyDetails::has_elderly,
        "Elderly Care",
        "{city} has accessible healthcare and a pace of life suitable for senior citizens.",
    ),
];

fn counted(count: u32, singular: &str, plural: &str) -> String {
    format!("{} {}", count, if count == 1 { singular } else { plural })
}

/// Who the advice is addressed to, e.g. "your nuclear family with 2 children".
pub fn family_description(family: &FamilyDetails) -> String {
    let base = match family.family_type {
        FamilyType::Joint => "your joint family",
        FamilyType::Nuclear => "your nuclear family",
        FamilyType::Couple => "you and your partner",
        FamilyType::Single => "you",
    };

    let children = counted(family.children, "child", "children");
    let elderly = counted(family.elderly, "elderly member", "elderly members");

    match (family.has_children(), family.has_elderly()) {
        (true, true) => format!("{} with {} and {}", base, children, elderly),
        (true, false) => format!("{} with {}", base, children),
        (false, true) => format!("{} with {}", base, elderly),
        (false, false) => base.to_string(),
    }
}

/// Verdict used when no city survives filtering.
pub fn no_results_verdict(profile: &UserProfile) -> String {
    format!(
        "Based on your criteria, we could not find cities with better air quality within {}km of {}. \
         Consider expanding your search radius or exploring remote work options in cleaner regions.",
        profile.max_distance_km, profile.current_city
    )
}

/// Generate the advisory narrative for a ranked list.
pub fn generate_verdict(
    profile: &UserProfile,
    recommendations: &[CityRecommendation],
    current_aqi: u32,
    target: &TargetAqiRange,
    life_years_gain: f64,
) -> String {
    let Some(top) = recommendations.first() else {
        return no_results_verdict(profile);
    };

    let family = &profile.family;
    let improvement = improvement_pct(current_aqi, top.average_aqi);
    let mut sections = Vec::new();

    sections.push(format!("Top Recommendation: {}, {}", top.name, top.state));

    sections.push(format!(
        "For {}, moving from {} to {} could reduce AQI exposure by {}%.",
        family_description(family),
        profile.current_city,
        top.name,
        improvement
    ));

    let mut target_block = format!(
        "Recommended Target AQI Range for Your Family: {} - {}\n\
         This range is based on your family composition",
        target.min, target.max
    );
    if family.has_conditions() {
        target_block.push_str(&format!(
            " and health conditions ({} respiratory concerns reported)",
            family.condition_count()
        ));
    }
    target_block.push('.');
    sections.push(target_block);

    if life_years_gain > 0.0 {
        let mut lines = vec![
            "Potential Health Benefit:".to_string(),
            format!("- Estimated life expectancy improvement: +{} years", life_years_gain),
        ];
        lines.extend(
            HEALTH_BENEFIT_RULES
                .iter()
                .filter(|(applies, _)| applies(family))
                .map(|(_, line)| format!("- {}", line)),
        );
        sections.push(lines.join("\n"));
    }

    let first = top
        .highlights
        .first()
        .map(String::as_str)
        .unwrap_or(FALLBACK_FIRST_HIGHLIGHT);
    let second = top
        .highlights
        .get(1)
        .map(String::as_str)
        .unwrap_or(FALLBACK_SECOND_HIGHLIGHT);
    sections.push(format!(
        "Key Benefits:\n- {}\n- {}\n- AQI improvement from {} to {}",
        first, second, current_aqi, top.average_aqi
    ));

    if let Some((_, heading, body)) = SUITABILITY_RULES.iter().find(|(applies, _, _)| applies(family)) {
        sections.push(format!("{}:\n{}", heading, body.replace("{city}", &top.name)));
    }

    let risk = top.risks.first().map(String::as_str).unwrap_or(FALLBACK_RISK);
    sections.push(format!("Consider: {}.", risk));

    sections.push(format!(
        "This migration could significantly improve your family's quality of life and long-term \
         health outcomes. We recommend visiting {} before making your final decision.",
        top.name
    ));

    sections.join("\n\n")
}

/// Whole-percent AQI reduction, rounded the same way as the report aggregate.
fn improvement_pct(current: u32, candidate: u32) -> i64 {
    aqi_improvement_pct(current, candidate).round() as i64
}

/// A structured explanation for one recommended city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityExplanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (2-3 sentences)
    pub detail: String,

    /// Sub-scores and facts behind the ranking
    pub evidence: Vec<EvidenceItem>,
}

/// A piece of evidence supporting a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub kind: String,

    pub value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl EvidenceItem {
    fn new(kind: &str, value: impl ToString) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.to_string(),
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Explain why a city made the list.
pub fn explain_recommendation(city: &CityRecommendation, current_aqi: u32) -> CityExplanation {
    CityExplanation {
        summary: summarize_city(city),
        detail: format!(
            "{} averages AQI {} ({}), {}% cleaner than your current {}. \
             It is {} km away. {}.",
            city.name,
            city.average_aqi,
            city.aqi_category.label(),
            improvement_pct(current_aqi, city.average_aqi),
            current_aqi,
            city.distance_km,
            city.community_profile
        ),
        evidence: vec![
            EvidenceItem::new("suitability", city.suitability_score),
            EvidenceItem::new("health_fit", city.health_score),
            EvidenceItem::new("profession_fit", city.profession_score),
            EvidenceItem::new("cultural_fit", city.cultural_score)
                .with_context(format!("Food compatibility {}", city.food_compatibility)),
            EvidenceItem::new("typical_daytime_aqi", city.moderate_aqi),
            EvidenceItem::new("rent_range", format!("{}-{}", city.rent_range.min, city.rent_range.max))
                .with_context("Monthly"),
        ],
    }
}

/// One-line listing of a recommendation.
pub fn summarize_city(city: &CityRecommendation) -> String {
    format!(
        "{}, {}: suitability {}/100, AQI {} ({}), {} km, rent {}-{}/month",
        city.name,
        city.state,
        city.suitability_score,
        city.average_aqi,
        city.aqi_category.label(),
        city.distance_km,
        city.rent_range.min,
        city.rent_range.max
    )
}

/// Aggregate metrics line for a report.
pub fn headline(report: &MigrationReport) -> String {
    if report.recommendations.is_empty() {
        return format!(
            "No cleaner cities found within {}km of {} (current AQI {})",
            report.profile.max_distance_km, report.profile.current_city, report.current_city_aqi
        );
    }
    format!(
        "AQI risk reduction {}% | readiness {}/100 | estimated +{} life years | target AQI {}-{}",
        report.aqi_risk_reduction,
        report.overall_readiness_score,
        report.estimated_life_years_gain,
        report.target_aqi.min,
        report.target_aqi.max
    )
}
