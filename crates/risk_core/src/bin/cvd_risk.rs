//! Command-line host for the CVD risk scorer

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cvd_risk_core::{
    FeatureMap, PatientVitals, RiskScorer, ScoreOptions, ScoreRequest, ScoringConfig,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cvd-risk", version, about = "Cardiovascular risk scoring with explanations")]
struct Cli {
    /// TOML config file (falls back to CVD_RISK_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model bundle, overriding the configured path
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score one patient from a JSON file
    Score {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long)]
        top_n: Option<usize>,

        /// Input holds raw vitals; BMI and pressures are derived
        #[arg(long)]
        vitals: bool,
    },
    /// Print the model health report
    Health,
    /// Print service information
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ScoringConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(model) = cli.model {
        config.model_path = model;
    }

    init_logging(&config.log_level);
    info!("Starting cvd-risk v{}", cvd_risk_core::VERSION);

    let scorer = RiskScorer::from_bundle_path(&config.model_path);

    match cli.command {
        Command::Score {
            input,
            threshold,
            top_n,
            vitals,
        } => {
            let defaults = config.score_options();
            let options = ScoreOptions {
                threshold: threshold.unwrap_or(defaults.threshold),
                top_n: top_n.unwrap_or(defaults.top_n),
            };

            let (patient_id, features) = read_request(&input, vitals)?;
            let result = match patient_id {
                Some(id) => scorer.score_patient(&id, &features, &options),
                None => scorer.score(&features, &options),
            };

            match result {
                Ok(result) => print_json(&result)?,
                Err(e) => {
                    error!(client_error = e.is_client_error(), "scoring failed: {}", e);
                    bail!(e);
                }
            }
        }
        Command::Health => print_json(&scorer.health())?,
        Command::Info => print_json(&scorer.info())?,
    }

    Ok(())
}

fn read_request(path: &Path, vitals: bool) -> Result<(Option<String>, FeatureMap)> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading input {}", path.display()))?;

    if vitals {
        let vitals: PatientVitals =
            serde_json::from_str(&json).context("parsing patient vitals")?;
        Ok((vitals.patient_id.clone(), vitals.to_feature_map()))
    } else {
        let request: ScoreRequest = serde_json::from_str(&json).context("parsing feature map")?;
        Ok((request.patient_id, request.features))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
