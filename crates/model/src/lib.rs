//! Core domain model for airhaven relocation analysis.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `UserProfile` / `FamilyDetails`: The household asking for advice
//! - `CityRecord`, `RentRange`, `CityProfile`: Catalogue schema
//! - `CityRecommendation`: A scored candidate city
//! - `MigrationReport`: The full ranked and narrated result

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Youngest and oldest applicant ages accepted by the intake form.
pub const AGE_RANGE: (u32, u32) = (18, 80);

/// Search radius bounds in kilometres.
pub const MAX_DISTANCE_RANGE_KM: (f64, f64) = (100.0, 2500.0);

/// Upper bound for household member counts.
pub const MAX_HOUSEHOLD_MEMBERS: u32 = 20;

/// Upper bound for children or elderly counts in larger households.
pub const MAX_DEPENDANTS: u32 = 10;

/// Caller-side validation failures for a profile.
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("Name must not be empty")]
    EmptyName,
    #[error("Current city must not be empty")]
    EmptyCity,
    #[error("Profession must not be empty")]
    EmptyProfession,
    #[error("Age {0} is outside the supported range 18-80")]
    AgeOutOfRange(u32),
    #[error("Max distance {0} km is outside the supported range 100-2500 km")]
    DistanceOutOfRange(f64),
    #[error("Monthly rent budget must be positive, got {0}")]
    InvalidBudget(f64),
    #[error("Unknown family type: {0}")]
    UnknownFamilyType(String),
    #[error("A {family_type} household cannot have {field} = {value}")]
    InconsistentHousehold {
        family_type: FamilyType,
        field: &'static str,
        value: u32,
    },
}

/// Household shape as picked on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyType {
    Single,
    Couple,
    Nuclear,
    Joint,
}

impl FamilyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Couple => "couple",
            Self::Nuclear => "nuclear",
            Self::Joint => "joint",
        }
    }

    /// Allowed `(min, max)` total members for this household shape.
    pub fn member_bounds(&self) -> (u32, u32) {
        match self {
            Self::Single => (1, 1),
            Self::Couple => (2, 2),
            Self::Nuclear | Self::Joint => (1, MAX_HOUSEHOLD_MEMBERS),
        }
    }

    pub fn max_children(&self) -> u32 {
        match self {
            Self::Single | Self::Couple => 0,
            Self::Nuclear | Self::Joint => MAX_DEPENDANTS,
        }
    }

    pub fn max_elderly(&self) -> u32 {
        match self {
            Self::Single => 0,
            Self::Couple => 2,
            Self::Nuclear | Self::Joint => MAX_DEPENDANTS,
        }
    }
}

impl fmt::Display for FamilyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FamilyType {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "couple" => Ok(Self::Couple),
            "nuclear" => Ok(Self::Nuclear),
            "joint" => Ok(Self::Joint),
            other => Err(ProfileError::UnknownFamilyType(other.to_string())),
        }
    }
}

/// Health condition reported for someone in the household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthCondition {
    Asthma,
    Copd,
    Bronchitis,
    Allergies,
    LungDisease,
    HeartDisease,
    ElderlyRespiratory,
    /// Anything else; details go in `FamilyDetails::other_condition`
    Other,
}

impl HealthCondition {
    /// Respiratory conditions that call for the strictest air target.
    pub fn is_severe(&self) -> bool {
        matches!(
            self,
            Self::Asthma | Self::Copd | Self::LungDisease | Self::ElderlyRespiratory
        )
    }

    /// Get a human-readable label for this condition.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Asthma => "Asthma",
            Self::Copd => "COPD",
            Self::Bronchitis => "Bronchitis",
            Self::Allergies => "Respiratory Allergies",
            Self::LungDisease => "Lung Disease",
            Self::HeartDisease => "Heart Disease",
            Self::ElderlyRespiratory => "Elderly Respiratory Issues",
            Self::Other => "Other",
        }
    }
}

impl From<&str> for HealthCondition {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "asthma" => Self::Asthma,
            "copd" => Self::Copd,
            "bronchitis" => Self::Bronchitis,
            "allergies" => Self::Allergies,
            "lung-disease" => Self::LungDisease,
            "heart-disease" => Self::HeartDisease,
            "elderly-respiratory" => Self::ElderlyRespiratory,
            _ => Self::Other,
        }
    }
}

/// Parse condition tags as entered on a form; `none` means no conditions.
pub fn parse_conditions<'a>(tags: impl IntoIterator<Item = &'a str>) -> BTreeSet<HealthCondition> {
    tags.into_iter()
        .filter(|t| !t.trim().is_empty() && !t.trim().eq_ignore_ascii_case("none"))
        .map(HealthCondition::from)
        .collect()
}

/// Deserialize condition tags with the same rules as `parse_conditions`.
fn deserialize_conditions<'de, D>(deserializer: D) -> Result<BTreeSet<HealthCondition>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = Vec::<String>::deserialize(deserializer)?;
    Ok(parse_conditions(tags.iter().map(String::as_str)))
}

/// Household composition and health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyDetails {
    pub family_type: FamilyType,

    pub total_members: u32,

    #[serde(default)]
    pub children: u32,

    /// Members aged 60 and over
    #[serde(default)]
    pub elderly: u32,

    #[serde(default, deserialize_with = "deserialize_conditions")]
    pub health_conditions: BTreeSet<HealthCondition>,

    /// Free-text note for `HealthCondition::Other` (display only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_condition: Option<String>,
}

impl FamilyDetails {
    pub fn new(family_type: FamilyType, total_members: u32) -> Self {
        Self {
            family_type,
            total_members,
            children: 0,
            elderly: 0,
            health_conditions: BTreeSet::new(),
            other_condition: None,
        }
    }

    pub fn with_children(mut self, children: u32) -> Self {
        self.children = children;
        self
    }

    pub fn with_elderly(mut self, elderly: u32) -> Self {
        self.elderly = elderly;
        self
    }

    pub fn with_condition(mut self, condition: HealthCondition) -> Self {
        self.health_conditions.insert(condition);
        self
    }

    pub fn has_children(&self) -> bool {
        self.children > 0
    }

    pub fn has_elderly(&self) -> bool {
        self.elderly > 0
    }

    pub fn has_conditions(&self) -> bool {
        !self.health_conditions.is_empty()
    }

    pub fn condition_count(&self) -> usize {
        self.health_conditions.len()
    }

    pub fn has_severe_condition(&self) -> bool {
        self.health_conditions.iter().any(HealthCondition::is_severe)
    }
}

impl Default for FamilyDetails {
    fn default() -> Self {
        Self::new(FamilyType::Single, 1)
    }
}

/// The household asking for relocation advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name used in the narrative
    pub name: String,

    /// Informational only
    #[serde(default)]
    pub age: u32,

    /// Must match a catalogue city (case-insensitive)
    pub current_city: String,

    /// Key into the profession affinity table
    pub profession: String,

    /// Inclusive search radius
    pub max_distance_km: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rent_budget: Option<f64>,

    #[serde(default)]
    pub family: FamilyDetails,
}

impl UserProfile {
    pub fn new(
        name: impl Into<String>,
        current_city: impl Into<String>,
        profession: impl Into<String>,
        max_distance_km: f64,
    ) -> Self {
        Self {
            name: name.into(),
            age: 30,
            current_city: current_city.into(),
            profession: profession.into(),
            max_distance_km,
            monthly_rent_budget: None,
            family: FamilyDetails::default(),
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.monthly_rent_budget = Some(budget);
        self
    }

    pub fn with_family(mut self, family: FamilyDetails) -> Self {
        self.family = family;
        self
    }

    /// Check the profile the way the intake form does before submission.
    ///
    /// The engine itself never calls this; it trusts its input.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if self.current_city.trim().is_empty() {
            return Err(ProfileError::EmptyCity);
        }
        if self.profession.trim().is_empty() {
            return Err(ProfileError::EmptyProfession);
        }
        if self.age < AGE_RANGE.0 || self.age > AGE_RANGE.1 {
            return Err(ProfileError::AgeOutOfRange(self.age));
        }

        let (min_km, max_km) = MAX_DISTANCE_RANGE_KM;
        if !self.max_distance_km.is_finite()
            || self.max_distance_km < min_km
            || self.max_distance_km > max_km
        {
            return Err(ProfileError::DistanceOutOfRange(self.max_distance_km));
        }

        if let Some(budget) = self.monthly_rent_budget {
            if !budget.is_finite() || budget <= 0.0 {
                return Err(ProfileError::InvalidBudget(budget));
            }
        }

        let family = &self.family;
        let family_type = family.family_type;
        let (min_members, max_members) = family_type.member_bounds();
        if family.total_members < min_members || family.total_members > max_members {
            return Err(ProfileError::InconsistentHousehold {
                family_type,
                field: "total_members",
                value: family.total_members,
            });
        }
        if family.children > family_type.max_children() {
            return Err(ProfileError::InconsistentHousehold {
                family_type,
                field: "children",
                value: family.children,
            });
        }
        if family.elderly > family_type.max_elderly() {
            return Err(ProfileError::InconsistentHousehold {
                family_type,
                field: "elderly",
                value: family.elderly,
            });
        }

        Ok(())
    }
}

/// A catalogue city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,

    pub state: String,

    /// Degrees
    pub latitude: f64,

    /// Degrees
    pub longitude: f64,

    /// Long-run average AQI
    pub baseline_aqi: u32,
}

impl CityRecord {
    pub fn new(
        name: impl Into<String>,
        state: impl Into<String>,
        latitude: f64,
        longitude: f64,
        baseline_aqi: u32,
    ) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            latitude,
            longitude,
            baseline_aqi,
        }
    }

    /// Case-insensitive name comparison used for lookups and self-exclusion.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Slug identifier, e.g. "New Delhi" -> "new-delhi".
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Monthly housing cost band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentRange {
    pub min: u32,
    pub max: u32,
}

impl RentRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Food availability scores by diet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodScores {
    pub veg: u32,
    pub non_veg: u32,
    pub jain: u32,
    /// Overall score; missing entries fall back at scoring time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<u32>,
}

/// Community and lifestyle description of a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityProfile {
    pub community: String,
    pub food_scores: FoodScores,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

/// AQI band, derived from the average reading only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AqiCategory {
    Good,
    Moderate,
    Poor,
    Unhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::Poor,
            151..=200 => Self::Unhealthy,
            _ => Self::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::Unhealthy => "Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }
}

/// Acceptable AQI band for a household. `min` is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAqiRange {
    pub min: u32,
    pub max: u32,
}

impl TargetAqiRange {
    pub const fn up_to(max: u32) -> Self {
        Self { min: 0, max }
    }
}

/// A scored candidate city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecommendation {
    pub id: String,
    pub name: String,
    pub state: String,

    /// Approximate daytime reading, display only
    pub moderate_aqi: u32,

    pub average_aqi: u32,

    /// Great-circle distance from the current city, rounded
    pub distance_km: u32,

    pub rent_range: RentRange,

    pub suitability_score: u32,
    pub profession_score: u32,
    pub cultural_score: u32,
    pub health_score: u32,
    pub food_compatibility: u32,

    pub community_profile: String,
    pub highlights: Vec<String>,
    pub risks: Vec<String>,

    pub aqi_category: AqiCategory,
}

/// Complete relocation report for one profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub profile: UserProfile,

    pub current_city_aqi: u32,

    /// At most five, best first
    pub recommendations: Vec<CityRecommendation>,

    /// Mean AQI reduction across recommendations, percent
    pub aqi_risk_reduction: u32,

    pub overall_readiness_score: u32,

    /// Narrative advisory text
    pub verdict: String,

    pub target_aqi: TargetAqiRange,

    /// Against the top recommendation, one decimal place
    pub estimated_life_years_gain: f64,

    pub generated_at: DateTime<Utc>,
}

impl MigrationReport {
    pub fn top_pick(&self) -> Option<&CityRecommendation> {
        self.recommendations.first()
    }
}
