//! Survey configuration file support.
//!
//! A survey is configured from a TOML file with `[site]`, `[tactician]` and
//! `[scheduler]` tables. Every table and key is optional:
//!
//! ```toml
//! default_exptime = 90.0
//!
//! [site]
//! name = "CTIO Blanco"
//! latitude = -30.16606
//! longitude = -70.81489
//! elevation_m = 2215.0
//!
//! [tactician]
//! strategy = "moon"
//! mode = "good"
//! max_airmass = 2.0
//! max_hour_angle = 78.75
//!
//! [scheduler]
//! retry_interval = 600.0
//! overhead = 30.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::astro::Site;
use crate::error::{Result, SchedulerError};
use crate::scheduler::SchedulerConfig;
use crate::tactician::TacticianConfig;

fn default_exptime() -> f64 {
    90.0
}

/// Complete configuration for one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Exposure time in seconds for catalogs without an exptime column.
    #[serde(default = "default_exptime")]
    pub default_exptime: f64,
    #[serde(default)]
    pub site: Site,
    #[serde(default)]
    pub tactician: TacticianConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            default_exptime: default_exptime(),
            site: Site::default(),
            tactician: TacticianConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl SurveyConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SurveyConfig = toml::from_str(content).map_err(|e| {
            SchedulerError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load survey configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SchedulerError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&content)?;
        info!("Loaded survey configuration from {}", path.display());
        Ok(config)
    }

    /// First `survey.toml` found in the current directory, `rust_backend/`
    /// or the parent directory.
    pub fn find_default_location() -> Option<PathBuf> {
        [
            PathBuf::from("survey.toml"),
            PathBuf::from("rust_backend/survey.toml"),
            PathBuf::from("../survey.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Load survey configuration from the default location.
    pub fn from_default_location() -> Result<Self> {
        let path = Self::find_default_location().ok_or_else(|| {
            SchedulerError::configuration("No survey.toml found in standard locations")
        })?;
        Self::from_file(path)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.default_exptime.is_finite() || self.default_exptime <= 0.0 {
            return Err(SchedulerError::configuration(format!(
                "default_exptime {} s must be positive",
                self.default_exptime
            )));
        }
        self.site.validate()?;
        self.tactician_config().validate()?;
        self.scheduler.validate()
    }

    /// Tactician settings with the `[site]` table filled in.
    pub fn tactician_config(&self) -> TacticianConfig {
        TacticianConfig {
            site: self.site.clone(),
            ..self.tactician.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tactician::StrategyKind;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SurveyConfig::from_toml_str("").unwrap();
        assert_eq!(config, SurveyConfig::default());
        assert_eq!(config.site, Site::blanco());
        assert_eq!(config.default_exptime, 90.0);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            default_exptime = 120.0

            [site]
            name = "Test"
            latitude = -29.0
            longitude = -70.0

            [tactician]
            strategy = "moon"
            mode = "poor"
            max_airmass = 1.8
            max_hour_angle = 60.0
            min_moon_angle = 45.0
            airmass_model = "hardie"

            [scheduler]
            retry_interval = 300.0
            overhead = 20.0

            [scheduler.slew_penalty]
            threshold = 10.0
            delay = 60.0
        "#;

        let config = SurveyConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.default_exptime, 120.0);
        assert_eq!(config.site.name, "Test");
        assert_eq!(config.site.elevation_m, 0.0);
        assert_eq!(
            config.tactician.strategy.parse::<StrategyKind>().unwrap(),
            StrategyKind::Moon
        );
        assert_eq!(config.tactician.max_hour_angle.value(), 60.0);
        assert_eq!(config.scheduler.retry_interval.value(), 300.0);
        let penalty = config.scheduler.slew_penalty.unwrap();
        assert_eq!(penalty.delay.value(), 60.0);

        let tactician = config.tactician_config();
        assert_eq!(tactician.site.latitude.value(), -29.0);
        assert_eq!(tactician.mode, "poor");
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let err = SurveyConfig::from_toml_str("[tactician]\nstrategy = \"greedy\"\n").unwrap_err();
        assert!(err.is_configuration());

        let err = SurveyConfig::from_toml_str("[tactician]\nmax_airmass = 0.5\n").unwrap_err();
        assert!(err.is_configuration());

        let err = SurveyConfig::from_toml_str("[site]\nlatitude = 120.0\nlongitude = 0.0\n")
            .unwrap_err();
        assert!(err.is_configuration());

        let err = SurveyConfig::from_toml_str("default_exptime = -1.0\n").unwrap_err();
        assert!(err.is_configuration());

        let err = SurveyConfig::from_toml_str("[scheduler]\nretry_interval = 0.0\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_malformed_toml() {
        let err = SurveyConfig::from_toml_str("[tactician\nstrategy = ").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "[tactician]\nstrategy = \"condition\"\nmode = \"good\"\n").unwrap();

        let config = SurveyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tactician.strategy, "condition");

        let err = SurveyConfig::from_file("/nonexistent/survey.toml").unwrap_err();
        assert!(err.is_configuration());
    }
}
