use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polars::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use survey_tactician::config::SurveyConfig;
use survey_tactician::io::{metrics_to_dataframe, write_chronology, CatalogLoader, WindowLoader};
use survey_tactician::preprocessing::CatalogValidator;
use survey_tactician::scheduler::Scheduler;
use survey_tactician::services::{HalfNightPlanner, WindowPlanner, WindowTable};
use survey_tactician::tactician::Tactician;
use survey_tactician::time::parse_utc;

#[derive(Parser)]
#[command(name = "survey-scheduler", version, about = "Survey field scheduler")]
struct Cli {
    /// Survey configuration (TOML). Defaults to survey.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Schedule a catalog over a list of observing windows
    Schedule {
        #[arg(long)]
        catalog: PathBuf,
        /// Observing windows (CSV or JSON)
        #[arg(long)]
        windows: PathBuf,
        /// Chronology output (.csv or .json)
        #[arg(long, default_value = "chronology.csv")]
        output: PathBuf,
        /// Treat windows as full nights and keep only the classified half
        #[arg(long, default_value_t = false)]
        half_nights: bool,
        /// Override the configured strategy
        #[arg(long)]
        strategy: Option<String>,
        /// Override the configured condition mode
        #[arg(long)]
        mode: Option<String>,
        /// Stop after this many observations
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print per-field sky metrics at one instant
    Inspect {
        #[arg(long)]
        catalog: PathBuf,
        /// UTC time (ISO-8601, YYYY/MM/DD HH:MM:SS or MJD)
        #[arg(long)]
        time: String,
        /// Write the table as CSV instead of printing it
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check a catalog and print a JSON report
    Validate {
        #[arg(long)]
        catalog: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<SurveyConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match SurveyConfig::find_default_location() {
            Some(path) => path,
            None => {
                info!("No survey.toml found, using defaults");
                return Ok(SurveyConfig::default());
            }
        },
    };
    SurveyConfig::from_file(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Schedule {
            catalog,
            windows,
            output,
            half_nights,
            strategy,
            mode,
            limit,
        } => {
            if let Some(strategy) = strategy {
                config.tactician.strategy = strategy;
            }
            if let Some(mode) = mode {
                config.tactician.mode = mode;
            }
            config.validate().context("Invalid configuration")?;

            let catalog = CatalogLoader::load_from_file(&catalog, config.default_exptime)?;
            let windows = WindowLoader::load_from_file(&windows)?;
            let windows = if half_nights {
                HalfNightPlanner::new(windows).windows()?
            } else {
                WindowTable::new(windows).windows()?
            };

            let mut scheduler =
                Scheduler::new(catalog, config.tactician_config(), config.scheduler.clone())?;
            let summary = scheduler.run_limited(&windows, limit)?;

            write_chronology(scheduler.chronology(), &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "Wrote {} entries to {} ({:?}, {} fields remaining)",
                summary.entries,
                output.display(),
                summary.status,
                summary.remaining
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Inspect {
            catalog,
            time,
            output,
        } => {
            config.validate().context("Invalid configuration")?;
            let time = parse_utc(&time).with_context(|| format!("Invalid time '{}'", time))?;
            let catalog = CatalogLoader::load_from_file(&catalog, config.default_exptime)?;

            let mut tactician = Tactician::new(&catalog, config.tactician_config())?;
            tactician.set_date(time);
            let mut df = metrics_to_dataframe(&catalog, &tactician)?;

            if let Some(sky) = tactician.sky() {
                info!(
                    "Zenith ({:.3}, {:.3}), Moon ({:.3}, {:.3}) at {:.1}% illumination",
                    sky.zenith.ra().value(),
                    sky.zenith.dec().value(),
                    sky.moon.ra().value(),
                    sky.moon.dec().value(),
                    sky.moon_phase
                );
            }
            match tactician.select_field(&catalog) {
                Some(selection) => info!(
                    "Next field: {} (score {:.2})",
                    selection.field_id, selection.score
                ),
                None => warn!("No viable field at {}", time),
            }

            match output {
                Some(path) => {
                    let mut file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    CsvWriter::new(&mut file)
                        .include_header(true)
                        .finish(&mut df)?;
                }
                None => println!("{}", df),
            }
        }
        Command::Validate { catalog } => {
            let validator = CatalogValidator::new(
                config.site.clone(),
                config.tactician.max_airmass,
                config.default_exptime,
            );
            let report = validator.validate_file(&catalog);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_valid {
                anyhow::bail!(
                    "{} has {} errors",
                    catalog.display(),
                    report.errors.len()
                );
            }
        }
    }

    Ok(())
}
