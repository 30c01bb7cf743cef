//! Scoring and ranking of candidate cities.
//!
//! Takes a household profile and a city catalogue and produces the
//! filtered, ranked and narrated `MigrationReport`.

use airhaven_catalogue::{CityCatalogue, DEFAULT_FOOD_COMPATIBILITY, DEFAULT_PROFESSION_CATEGORY};
use airhaven_explain::generate_verdict;
use airhaven_features::{
    affordability_score, aqi_improvement_pct, aqi_score, cultural_score, distance_km,
    distance_score, health_score, life_years_gain, target_aqi_range,
};
use airhaven_model::{
    AqiCategory, CityRecommendation, CityRecord, FamilyDetails, MigrationReport, TargetAqiRange,
    UserProfile,
};
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest daytime reading ever displayed.
pub const MIN_MODERATE_AQI: u32 = 20;

/// Errors that abort report generation.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Current city '{city}' not found in catalogue")]
    UnknownCurrentCity { city: String },
}

/// Weights of the composite suitability score.
///
/// Health and profession share a fixed mass: households reporting health
/// conditions move weight from profession fit to health fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub aqi: f64,
    pub distance: f64,
    pub affordability: f64,
    /// Health weight without reported conditions
    pub health: f64,
    /// Health weight when any condition is reported
    pub health_with_conditions: f64,
    /// Combined health + profession weight
    pub health_and_profession: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            aqi: 0.25,
            distance: 0.10,
            affordability: 0.15,
            health: 0.30,
            health_with_conditions: 0.40,
            health_and_profession: 0.50,
        }
    }
}

impl ScoringWeights {
    pub fn health_weight(&self, family: &FamilyDetails) -> f64 {
        if family.has_conditions() {
            self.health_with_conditions
        } else {
            self.health
        }
    }

    pub fn profession_weight(&self, family: &FamilyDetails) -> f64 {
        self.health_and_profession - self.health_weight(family)
    }

    /// Weighted composite, rounded. Not clamped.
    pub fn composite(&self, family: &FamilyDetails, scores: &SubScores) -> u32 {
        let total = scores.aqi * self.aqi
            + scores.health * self.health_weight(family)
            + scores.distance * self.distance
            + scores.affordability * self.affordability
            + scores.profession * self.profession_weight(family);
        total.round().max(0.0) as u32
    }
}

/// Per-city inputs to the composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub aqi: f64,
    pub health: f64,
    pub distance: f64,
    pub affordability: f64,
    pub profession: f64,
}

/// Configuration for the report engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum recommendations kept
    pub top_n: usize,
    pub weights: ScoringWeights,
    /// Jitter `moderate_aqi` around the baseline; off means it equals the baseline
    pub reading_noise: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            weights: ScoringWeights::default(),
            reading_noise: true,
        }
    }
}

/// Why a catalogue city was not scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// The user's own city (case-insensitive)
    CurrentCity,
    /// Outside the search radius
    TooFar { distance_km: u32 },
    /// Air is not strictly cleaner
    NoImprovement { aqi: u32 },
}

/// Produces migration reports over a read-only catalogue.
#[derive(Debug, Clone)]
pub struct ReportEngine<C> {
    catalogue: C,
    config: EngineConfig,
}

impl<C: CityCatalogue> ReportEngine<C> {
    pub fn new(catalogue: C, config: EngineConfig) -> Self {
        Self { catalogue, config }
    }

    pub fn catalogue(&self) -> &C {
        &self.catalogue
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate a report, timestamped now.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        profile: &UserProfile,
        rng: &mut R,
    ) -> Result<MigrationReport, EngineError> {
        self.generate_at(profile, rng, Utc::now())
    }

    /// Generate a report with reading noise drawn from a fixed seed.
    pub fn generate_seeded(
        &self,
        profile: &UserProfile,
        seed: u64,
    ) -> Result<MigrationReport, EngineError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.generate(profile, &mut rng)
    }

    /// Generate a report with an explicit timestamp.
    pub fn generate_at<R: Rng + ?Sized>(
        &self,
        profile: &UserProfile,
        rng: &mut R,
        generated_at: DateTime<Utc>,
    ) -> Result<MigrationReport, EngineError> {
        let current = self.resolve_current_city(profile)?;
        let current_aqi = current.baseline_aqi;
        let target = target_aqi_range(&profile.family);

        tracing::debug!(
            city = %current.name,
            aqi = current_aqi,
            target_max = target.max,
            catalogue = %self.catalogue.name(),
            "Resolved current city"
        );

        if !self.catalogue.has_profession(&profile.profession) {
            tracing::warn!(
                profession = %profile.profession,
                fallback = DEFAULT_PROFESSION_CATEGORY,
                "Unmapped profession, using fallback affinity table"
            );
        }

        let recommendations = self.rank(current, &target, profile, rng);

        let aqi_risk_reduction = mean_rounded(
            recommendations
                .iter()
                .map(|r| aqi_improvement_pct(current_aqi, r.average_aqi)),
        );
        let overall_readiness_score =
            mean_rounded(recommendations.iter().map(|r| r.suitability_score as f64));
        let estimated_life_years_gain = recommendations
            .first()
            .map(|top| life_years_gain(current_aqi, top.average_aqi, &profile.family))
            .unwrap_or(0.0);

        let verdict = generate_verdict(
            profile,
            &recommendations,
            current_aqi,
            &target,
            estimated_life_years_gain,
        );

        tracing::debug!(
            recommendations = recommendations.len(),
            readiness = overall_readiness_score,
            "Generated migration report"
        );

        Ok(MigrationReport {
            profile: profile.clone(),
            current_city_aqi: current_aqi,
            recommendations,
            aqi_risk_reduction,
            overall_readiness_score,
            verdict,
            target_aqi: target,
            estimated_life_years_gain,
            generated_at,
        })
    }

    /// Look up the profile's current city, case-insensitively.
    pub fn resolve_current_city(&self, profile: &UserProfile) -> Result<&CityRecord, EngineError> {
        self.catalogue
            .find_city(&profile.current_city)
            .ok_or_else(|| EngineError::UnknownCurrentCity {
                city: profile.current_city.clone(),
            })
    }

    /// Filter, score, sort and truncate every other catalogue city.
    pub fn rank<R: Rng + ?Sized>(
        &self,
        current: &CityRecord,
        target: &TargetAqiRange,
        profile: &UserProfile,
        rng: &mut R,
    ) -> Vec<CityRecommendation> {
        let mut scored: Vec<CityRecommendation> = self
            .catalogue
            .cities()
            .iter()
            .filter_map(|candidate| self.score_city(candidate, current, target, profile, &mut *rng))
            .collect();

        // Best first; ties by name, then catalogue order (stable sort)
        scored.sort_by(|a, b| {
            b.suitability_score
                .cmp(&a.suitability_score)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        scored.truncate(self.config.top_n);

        scored
    }

    /// Decide whether a candidate is eligible, returning its distance if so.
    pub fn screen(
        &self,
        candidate: &CityRecord,
        current: &CityRecord,
        profile: &UserProfile,
    ) -> Result<u32, Exclusion> {
        if candidate.is_named(&profile.current_city) || candidate.is_named(&current.name) {
            return Err(Exclusion::CurrentCity);
        }

        // Negated so a NaN radius admits nothing
        let distance = distance_km(current, candidate);
        if !(distance as f64 <= profile.max_distance_km) {
            return Err(Exclusion::TooFar {
                distance_km: distance,
            });
        }

        if candidate.baseline_aqi >= current.baseline_aqi {
            return Err(Exclusion::NoImprovement {
                aqi: candidate.baseline_aqi,
            });
        }

        Ok(distance)
    }

    /// Score one candidate, or `None` if it is excluded.
    pub fn score_city<R: Rng + ?Sized>(
        &self,
        candidate: &CityRecord,
        current: &CityRecord,
        target: &TargetAqiRange,
        profile: &UserProfile,
        rng: &mut R,
    ) -> Option<CityRecommendation> {
        let distance = match self.screen(candidate, current, profile) {
            Ok(distance) => distance,
            Err(reason) => {
                tracing::trace!(city = %candidate.name, ?reason, "Excluded candidate");
                return None;
            }
        };

        let rent_range = self.catalogue.rent_range(&candidate.name);
        let city_profile = self.catalogue.profile(&candidate.name);
        let profession_score = self
            .catalogue
            .profession_score(&profile.profession, &candidate.name);
        let food_compatibility = city_profile
            .food_scores
            .any
            .unwrap_or(DEFAULT_FOOD_COMPATIBILITY);
        let health = health_score(candidate.baseline_aqi, target, &profile.family);

        let scores = SubScores {
            aqi: aqi_score(current.baseline_aqi, candidate.baseline_aqi),
            health: health as f64,
            distance: distance_score(distance, profile.max_distance_km),
            affordability: affordability_score(profile.monthly_rent_budget, &rent_range),
            profession: profession_score as f64,
        };
        let suitability_score = self.config.weights.composite(&profile.family, &scores);

        Some(CityRecommendation {
            id: candidate.slug(),
            name: candidate.name.clone(),
            state: candidate.state.clone(),
            moderate_aqi: self.moderate_reading(candidate.baseline_aqi, rng),
            average_aqi: candidate.baseline_aqi,
            distance_km: distance,
            rent_range,
            suitability_score,
            profession_score,
            cultural_score: cultural_score(food_compatibility),
            health_score: health,
            food_compatibility,
            community_profile: city_profile.community.clone(),
            highlights: city_profile.highlights.clone(),
            risks: city_profile.risks.clone(),
            aqi_category: AqiCategory::from_aqi(candidate.baseline_aqi),
        })
    }

    /// Typical daytime reading: baseline plus noise in [-5, 10), floored at 20.
    fn moderate_reading<R: Rng + ?Sized>(&self, baseline: u32, rng: &mut R) -> u32 {
        if !self.config.reading_noise {
            return baseline;
        }
        let noise: i64 = rng.gen_range(-5..10);
        (baseline as i64 + noise).max(MIN_MODERATE_AQI as i64) as u32
    }
}

fn mean_rounded(values: impl Iterator<Item = f64>) -> u32 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0;
    }
    (sum / count as f64).round().max(0.0) as u32
}
