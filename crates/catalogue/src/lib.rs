//! City catalogue: the static reference data the engine queries.
//!
//! Provides the `CityCatalogue` trait and its in-memory implementation.
//! Scoring code only talks to the trait, so tests can swap in synthetic
//! city sets without touching the bundled dataset.
//!
//! Missing table entries are never errors; every lookup has a named
//! fallback below.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use airhaven_model::{CityProfile, CityRecord, FoodScores, RentRange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bundled Indian city dataset.
pub const BUILTIN_INDIA_JSON: &str = include_str!("../data/india.json");

/// Rent band used when a city has no entry in the rent table.
pub const DEFAULT_RENT_RANGE: RentRange = RentRange::new(10_000, 25_000);

/// Profession table consulted when the user's profession is unmapped.
pub const DEFAULT_PROFESSION_CATEGORY: &str = "Other";

/// Affinity for a city missing from the profession table.
pub const DEFAULT_PROFESSION_SCORE: u32 = 50;

/// Food compatibility when a profile has no overall (`any`) score.
pub const DEFAULT_FOOD_COMPATIBILITY: u32 = 70;

/// Food scores of the fallback profile.
pub const DEFAULT_FOOD_SCORES: FoodScores = FoodScores {
    veg: 75,
    non_veg: 75,
    jain: 60,
    any: Some(80),
};

/// Profile used when a city has no entry in the profile table.
pub fn default_city_profile() -> CityProfile {
    CityProfile {
        community: "Growing urban center".to_string(),
        food_scores: DEFAULT_FOOD_SCORES,
        highlights: vec!["Developing infrastructure".to_string()],
        risks: vec!["Limited data available".to_string()],
    }
}

/// Errors raised while loading a catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("Failed to read catalogue {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalogue: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid city '{name}': {reason}")]
    InvalidCity { name: String, reason: String },

    #[error("Invalid rent range for '{city}': min {min} exceeds max {max}")]
    InvalidRentRange { city: String, min: u32, max: u32 },
}

/// Read-only access to city reference data.
///
/// This abstraction keeps the scoring pipeline independent of where the
/// data comes from.
pub trait CityCatalogue {
    /// All cities, in catalogue order.
    fn cities(&self) -> &[CityRecord];

    /// Rent band for a city, falling back to `DEFAULT_RENT_RANGE`.
    fn rent_range(&self, city: &str) -> RentRange;

    /// Community profile for a city, falling back to `default_city_profile()`.
    fn profile(&self, city: &str) -> Cow<'_, CityProfile>;

    /// Whether the profession has its own affinity table.
    fn has_profession(&self, profession: &str) -> bool;

    /// Profession affinity for a city.
    ///
    /// Unmapped professions use the `DEFAULT_PROFESSION_CATEGORY` table;
    /// cities absent from the table score `DEFAULT_PROFESSION_SCORE`.
    fn profession_score(&self, profession: &str, city: &str) -> u32;

    /// Get the catalogue name for logging.
    fn name(&self) -> &str;

    /// Case-insensitive exact-name lookup. First match wins.
    fn find_city(&self, name: &str) -> Option<&CityRecord> {
        self.cities().iter().find(|c| c.is_named(name))
    }
}

/// Catalogue held entirely in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalogue {
    #[serde(default)]
    pub name: String,

    pub cities: Vec<CityRecord>,

    /// profession -> city -> score
    #[serde(default)]
    pub profession_affinity: BTreeMap<String, BTreeMap<String, u32>>,

    #[serde(default)]
    pub rent_ranges: BTreeMap<String, RentRange>,

    #[serde(default)]
    pub profiles: BTreeMap<String, CityProfile>,
}

impl StaticCatalogue {
    /// Create an empty catalogue, mostly for building test fixtures.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load the bundled Indian city dataset.
    pub fn builtin() -> Result<Self, CatalogueError> {
        Self::from_json_str(BUILTIN_INDIA_JSON)
    }

    /// Parse and validate a catalogue from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogueError> {
        let catalogue: Self = serde_json::from_str(json)?;
        catalogue.validate()?;

        tracing::info!(
            catalogue = %catalogue.name,
            cities = catalogue.cities.len(),
            professions = catalogue.profession_affinity.len(),
            "Loaded city catalogue"
        );

        Ok(catalogue)
    }

    /// Load a catalogue from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogueError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_city(mut self, city: CityRecord) -> Self {
        self.cities.push(city);
        self
    }

    pub fn with_rent_range(mut self, city: impl Into<String>, range: RentRange) -> Self {
        self.rent_ranges.insert(city.into(), range);
        self
    }

    pub fn with_profile(mut self, city: impl Into<String>, profile: CityProfile) -> Self {
        self.profiles.insert(city.into(), profile);
        self
    }

    pub fn with_profession_scores<'a>(
        mut self,
        profession: impl Into<String>,
        scores: impl IntoIterator<Item = (&'a str, u32)>,
    ) -> Self {
        let table = self.profession_affinity.entry(profession.into()).or_default();
        table.extend(scores.into_iter().map(|(city, score)| (city.to_string(), score)));
        self
    }

    /// Professions with their own affinity table, sorted.
    pub fn professions(&self) -> impl Iterator<Item = &str> {
        self.profession_affinity.keys().map(String::as_str)
    }

    fn validate(&self) -> Result<(), CatalogueError> {
        for city in &self.cities {
            let invalid = |reason: &str| CatalogueError::InvalidCity {
                name: city.name.clone(),
                reason: reason.to_string(),
            };

            if city.name.trim().is_empty() {
                return Err(invalid("empty name"));
            }
            if !city.latitude.is_finite() || city.latitude.abs() > 90.0 {
                return Err(invalid("latitude out of range"));
            }
            if !city.longitude.is_finite() || city.longitude.abs() > 180.0 {
                return Err(invalid("longitude out of range"));
            }
        }

        for (city, range) in &self.rent_ranges {
            if range.min > range.max {
                return Err(CatalogueError::InvalidRentRange {
                    city: city.clone(),
                    min: range.min,
                    max: range.max,
                });
            }
        }

        Ok(())
    }
}

impl CityCatalogue for StaticCatalogue {
    fn cities(&self) -> &[CityRecord] {
        &self.cities
    }

    fn rent_range(&self, city: &str) -> RentRange {
        self.rent_ranges.get(city).copied().unwrap_or(DEFAULT_RENT_RANGE)
    }

    fn profile(&self, city: &str) -> Cow<'_, CityProfile> {
        match self.profiles.get(city) {
            Some(profile) => Cow::Borrowed(profile),
            None => Cow::Owned(default_city_profile()),
        }
    }

    fn has_profession(&self, profession: &str) -> bool {
        self.profession_affinity.contains_key(profession)
    }

    fn profession_score(&self, profession: &str, city: &str) -> u32 {
        self.profession_affinity
            .get(profession)
            .or_else(|| self.profession_affinity.get(DEFAULT_PROFESSION_CATEGORY))
            .and_then(|table| table.get(city))
            .copied()
            .unwrap_or(DEFAULT_PROFESSION_SCORE)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let catalogue = StaticCatalogue::builtin().unwrap();
        assert_eq!(catalogue.name(), "india");
        assert_eq!(catalogue.cities().len(), 25);
        assert_eq!(catalogue.profession_affinity.len(), 8);
        assert_eq!(catalogue.profiles.len(), 25);
    }

    #[test]
    fn test_find_city_case_insensitive() {
        let catalogue = StaticCatalogue::builtin().unwrap();
        let delhi = catalogue.find_city("delhi").unwrap();
        assert_eq!(delhi.baseline_aqi, 285);
        assert!(catalogue.find_city("  SHIMLA ").is_some());
        assert!(catalogue.find_city("Atlantis").is_none());
    }

    #[test]
    fn test_profession_lookup_and_fallbacks() {
        let catalogue = StaticCatalogue::builtin().unwrap();
        assert_eq!(catalogue.profession_score("IT/Software", "Bangalore"), 95);
        assert_eq!(catalogue.profession_score("IT/Software", "Shimla"), DEFAULT_PROFESSION_SCORE);
        // Unmapped profession reads the "Other" table
        assert!(!catalogue.has_profession("Astronaut"));
        assert_eq!(catalogue.profession_score("Astronaut", "Bangalore"), 75);
    }

    #[test]
    fn test_rent_and_profile_fallbacks() {
        let catalogue = StaticCatalogue::new("tiny")
            .with_city(CityRecord::new("Nowhere", "Nowhere", 10.0, 10.0, 30));

        assert_eq!(catalogue.rent_range("Nowhere"), DEFAULT_RENT_RANGE);
        let profile = catalogue.profile("Nowhere");
        assert_eq!(profile.community, "Growing urban center");
        assert_eq!(profile.food_scores.any, Some(80));
        assert_eq!(profile.highlights, vec!["Developing infrastructure".to_string()]);
        assert_eq!(profile.risks, vec!["Limited data available".to_string()]);
        assert_eq!(catalogue.profession_score("Other", "Nowhere"), DEFAULT_PROFESSION_SCORE);
    }

    #[test]
    fn test_rejects_inverted_rent_range() {
        let json = r#"{
            "name": "broken",
            "cities": [],
            "rent_ranges": { "Somewhere": { "min": 30000, "max": 10000 } }
        }"#;
        assert!(matches!(
            StaticCatalogue::from_json_str(json),
            Err(CatalogueError::InvalidRentRange { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_coordinates() {
        let json = r#"{
            "cities": [
                { "name": "Offworld", "state": "Mars", "latitude": 120.0, "longitude": 0.0, "baseline_aqi": 5 }
            ]
        }"#;
        assert!(matches!(
            StaticCatalogue::from_json_str(json),
            Err(CatalogueError::InvalidCity { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = StaticCatalogue::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogueError::Io { .. }));
    }
}
