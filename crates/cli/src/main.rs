//! Command-line front end for relocation reports.
//!
//! Usage:
//!     airhaven recommend --name Asha --city Delhi --profession IT/Software --children 1
//!     airhaven recommend --profile profile.json --format json --seed 7
//!     airhaven cities
//!     airhaven threshold --children 1 --elderly 1 --condition asthma

use std::path::{Path, PathBuf};

use airhaven_catalogue::{CityCatalogue, StaticCatalogue};
use airhaven_explain::{explain_recommendation, headline, summarize_city};
use airhaven_features::target_aqi_range;
use airhaven_model::{parse_conditions, AqiCategory, FamilyDetails, FamilyType, UserProfile};
use airhaven_rerank::{EngineConfig, ReportEngine};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Parser)]
#[command(name = "airhaven")]
#[command(about = "Recommend cleaner-air relocation cities for a household")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalogue JSON file (defaults to the bundled Indian cities)
    #[arg(long, global = true)]
    catalogue: Option<PathBuf>,

    /// Engine configuration JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank cities for a household
    Recommend {
        /// Read the profile from a JSON file instead of flags
        #[arg(long, conflicts_with_all = [
            "name", "age", "city", "profession", "max_distance", "budget",
            "family_type", "members", "children", "elderly", "conditions", "other_condition",
        ])]
        profile: Option<PathBuf>,

        #[command(flatten)]
        person: PersonArgs,

        #[command(flatten)]
        household: HouseholdArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Seed for the daytime reading noise
        #[arg(long)]
        seed: Option<u64>,

        /// Report daytime readings equal to the average
        #[arg(long)]
        no_noise: bool,
    },

    /// List catalogue cities
    Cities,

    /// Show the target AQI range for a household
    Threshold {
        #[command(flatten)]
        household: HouseholdArgs,
    },
}

#[derive(Args)]
struct PersonArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long, default_value_t = 30)]
    age: u32,

    /// Current city
    #[arg(long)]
    city: Option<String>,

    #[arg(long, default_value = "Other")]
    profession: String,

    /// Search radius in km
    #[arg(long, default_value_t = 500.0)]
    max_distance: f64,

    /// Monthly rent budget
    #[arg(long)]
    budget: Option<f64>,
}

#[derive(Args)]
struct HouseholdArgs {
    /// single, couple, nuclear or joint
    #[arg(long, default_value = "nuclear")]
    family_type: String,

    /// Total household members (defaults per family type)
    #[arg(long)]
    members: Option<u32>,

    #[arg(long, default_value_t = 0)]
    children: u32,

    /// Members aged 60+
    #[arg(long, default_value_t = 0)]
    elderly: u32,

    /// Health condition tag, repeatable
    #[arg(long = "condition")]
    conditions: Vec<String>,

    /// Free-text description for "other"
    #[arg(long)]
    other_condition: Option<String>,
}

impl HouseholdArgs {
    fn to_family(&self) -> Result<FamilyDetails> {
        let family_type: FamilyType = self.family_type.parse()?;
        let members = self.members.unwrap_or_else(|| match family_type {
            FamilyType::Single => 1,
            FamilyType::Couple => 2,
            FamilyType::Nuclear | FamilyType::Joint => {
                (2 + self.children + self.elderly).min(airhaven_model::MAX_HOUSEHOLD_MEMBERS)
            }
        });

        Ok(FamilyDetails {
            family_type,
            total_members: members,
            children: self.children,
            elderly: self.elderly,
            health_conditions: parse_conditions(self.conditions.iter().map(String::as_str)),
            other_condition: self.other_condition.clone(),
        })
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("airhaven=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let catalogue = match &cli.catalogue {
        Some(path) => StaticCatalogue::from_path(path)?,
        None => StaticCatalogue::builtin()?,
    };

    match cli.command {
        Commands::Recommend {
            profile,
            person,
            household,
            format,
            seed,
            no_noise,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if no_noise {
                config.reading_noise = false;
            }
            let profile = match profile {
                Some(path) => read_profile(&path)?,
                None => build_profile(person, &household)?,
            };
            run_recommend(ReportEngine::new(catalogue, config), &profile, &format, seed)?;
        }
        Commands::Cities => {
            run_cities(&catalogue);
        }
        Commands::Threshold { household } => {
            run_threshold(&household)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

fn read_profile(path: &Path) -> Result<UserProfile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    let profile = serde_json::from_str(&json)
        .with_context(|| format!("Invalid profile {}", path.display()))?;
    Ok(profile)
}

fn build_profile(person: PersonArgs, household: &HouseholdArgs) -> Result<UserProfile> {
    let name = person.name.context("--name is required without --profile")?;
    let city = person.city.context("--city is required without --profile")?;

    let mut profile = UserProfile::new(name, city, person.profession, person.max_distance)
        .with_age(person.age)
        .with_family(household.to_family()?);
    profile.monthly_rent_budget = person.budget;
    Ok(profile)
}

fn run_recommend(
    engine: ReportEngine<StaticCatalogue>,
    profile: &UserProfile,
    format: &str,
    seed: Option<u64>,
) -> Result<()> {
    profile.validate()?;

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let report = engine.generate(profile, &mut rng)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Relocation report for {} (from {}, AQI {} {})",
        profile.name,
        profile.current_city,
        report.current_city_aqi,
        AqiCategory::from_aqi(report.current_city_aqi).label()
    );
    println!("{}", headline(&report));
    println!("---");

    for (i, city) in report.recommendations.iter().enumerate() {
        let explanation = explain_recommendation(city, report.current_city_aqi);
        println!("\n{}. {}", i + 1, summarize_city(city));
        println!("   {}", explanation.detail);
        println!(
            "   Health {} | Profession {} | Cultural {} | Daytime AQI ~{}",
            city.health_score, city.profession_score, city.cultural_score, city.moderate_aqi
        );
    }

    println!("\n---\n{}", report.verdict);

    Ok(())
}

fn run_cities(catalogue: &StaticCatalogue) {
    println!("Catalogue: {}", catalogue.name());
    for city in catalogue.cities() {
        println!(
            "  {:<20} {:<18} AQI {:>3} ({})",
            city.name,
            city.state,
            city.baseline_aqi,
            AqiCategory::from_aqi(city.baseline_aqi).label()
        );
    }
    println!("Professions: {}", catalogue.professions().collect::<Vec<_>>().join(", "));
}

fn run_threshold(household: &HouseholdArgs) -> Result<()> {
    let family = household.to_family()?;
    let target = target_aqi_range(&family);
    println!("Target AQI range: {} - {}", target.min, target.max);
    Ok(())
}
