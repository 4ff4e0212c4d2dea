use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use carelog_core::{AnalyticsConfig, DoseEvent, DoseUnit, MeasurementType, Sex};
use carelog_engine::{
    age_in_months, analyze_bundle_str, render_json, render_text, ChildBundle, HealthStore,
    MedicationDoseEngine, MemoryStore, PercentileCalculator, ReferenceCurveStore,
};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "carelog-cli",
    about = "Growth, activity and medication analytics for a child bundle."
)]
struct Args {
    /// JSON file overriding the default analytics configuration.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the report for a child bundle.
    Report {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Grade one value against the built-in reference curves.
    Percentile {
        #[arg(long, value_parser = keyword::<Sex>)]
        sex: Sex,
        #[arg(long)]
        age_weeks: u32,
        #[arg(long = "type", value_parser = keyword::<MeasurementType>)]
        kind: MeasurementType,
        #[arg(long)]
        value: f64,
    },
    /// Recommend a dose and check a proposed one against the bundle's dose log.
    Dose {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        medication: String,
        #[arg(short, long)]
        amount: f64,
        #[arg(short, long, value_parser = keyword::<DoseUnit>, default_value = "mg")]
        unit: DoseUnit,
        /// RFC 3339 time of the proposed dose; defaults to now.
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Overrides the latest recorded weight.
        #[arg(long)]
        weight_kg: Option<f64>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            read_json::<AnalyticsConfig>(path)?
        }
        None => AnalyticsConfig::default(),
    };

    match args.command {
        Command::Report { input, format } => {
            let data = read(&input)?;
            let report = analyze_bundle_str(&data, &config)?;
            match format {
                Format::Text => print!("{}", render_text(&report)),
                Format::Json => println!("{}", render_json(&report)?),
            }
        }
        Command::Percentile {
            sex,
            age_weeks,
            kind,
            value,
        } => {
            let references = ReferenceCurveStore::builtin();
            let calculator = PercentileCalculator::with_bounds(&references, config.bounds);
            match calculator.classify(sex, age_weeks, kind, value)? {
                Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                None => bail!("no reference curve for {} {}", sex.label(), kind.label()),
            }
        }
        Command::Dose {
            input,
            medication,
            amount,
            unit,
            at,
            weight_kg,
        } => {
            let bundle: ChildBundle = read_json(&input)?;
            let at = at.unwrap_or_else(Utc::now);
            let verdict = dose(&bundle, &config, &medication, amount, unit, at, weight_kg)?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
    }

    Ok(())
}

fn dose(
    bundle: &ChildBundle,
    config: &AnalyticsConfig,
    medication: &str,
    amount: f64,
    unit: DoseUnit,
    at: DateTime<Utc>,
    weight_kg: Option<f64>,
) -> anyhow::Result<serde_json::Value> {
    let store = MemoryStore::from_bundle(bundle)?;
    let child = &bundle.child;
    let profile = store
        .medication_profile(medication)?
        .with_context(|| format!("Unknown medication {medication}"))?;

    let weight_kg = match weight_kg {
        Some(weight) => Some(weight),
        None => store
            .measurements_for(&child.id, None)?
            .iter()
            .find_map(|measurement| measurement.weight_kg),
    };
    let local_day = at.with_timezone(&config.local_offset()).date_naive();
    let age_months = age_in_months(child.date_of_birth, local_day);

    let engine = MedicationDoseEngine::new(config);
    let outcome = engine.recommended_dose(&profile, age_months, weight_kg)?;

    let proposed = DoseEvent {
        child_id: child.id.clone(),
        medication_id: profile.id.clone(),
        amount,
        unit,
        administered_at: at,
    };
    let history = store.dose_history_for(&child.id, &profile.id, at - Duration::days(2))?;
    let verdict = match outcome.recommendation() {
        Some(recommendation) => {
            engine.check_recommended_dose_safety(&profile, recommendation, &proposed, &history)?
        }
        None => engine.check_dose_safety(&profile, &proposed, &history)?,
    };

    Ok(serde_json::json!({
        "age_months": age_months,
        "recommendation": outcome,
        "verdict": verdict,
    }))
}

/// Parses a snake_case keyword through the type's serde representation.
fn keyword<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|err| err.to_string())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Could not read file {path:?}"))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let data = read(path)?;
    serde_json::from_str(&data).with_context(|| format!("Could not parse JSON in {path:?}"))
}
