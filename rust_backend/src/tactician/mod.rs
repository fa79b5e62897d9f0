//! Per-instant field selection.
//!
//! The [`Tactician`] holds a snapshot of catalog positions, recomputes sky
//! metrics whenever the date or the previous pointing changes, filters the
//! fields that can be observed right now and asks its [`Strategy`] which
//! one to take.
//!
//! # Example
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use survey_tactician::parsing::catalog_parser::parse_catalog_csv;
//! use survey_tactician::tactician::{Tactician, TacticianConfig};
//! use std::path::Path;
//!
//! let catalog = parse_catalog_csv(Path::new("fields.csv"), 90.0).unwrap();
//! let mut tactician = Tactician::new(&catalog, TacticianConfig::default()).unwrap();
//! tactician.set_date(Utc.with_ymd_and_hms(2017, 2, 8, 4, 0, 0).unwrap());
//! if let Some(selection) = tactician.select_field(&catalog) {
//!     println!("next field: {}", selection.field_id);
//! }
//! ```

pub mod strategy;


use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use qtty::Degrees;
use serde::{Deserialize, Serialize};

use crate::astro::{
    airmass_from_zenith, angular_separation, hour_angle_from_zenith, Airmass, AirmassModel,
    Equatorial, Site, SkyState,
};
use crate::core::domain::{Field, FieldCatalog, FieldId};
use crate::error::{Result, SchedulerError};

pub use strategy::{
    AirmassBand, ConditionStrategy, CoverageStrategy, MoonBands, MoonStrategy, Strategy,
    StrategyKind,
};

fn default_strategy() -> String {
    StrategyKind::Coverage.as_str().to_string()
}

fn default_mode() -> String {
    "none".to_string()
}

fn default_max_airmass() -> f64 {
    2.0
}

fn default_max_hour_angle() -> Degrees {
    Degrees::new(78.75)
}

fn default_min_moon_angle() -> Degrees {
    Degrees::new(30.0)
}

/// Tactician settings, usually read from the `[tactician]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticianConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Fields at or above this airmass are not viable.
    #[serde(default = "default_max_airmass")]
    pub max_airmass: f64,
    /// Fields with |hour angle| at or above this are not viable.
    #[serde(default = "default_max_hour_angle")]
    pub max_hour_angle: Degrees,
    /// Used by strategies that keep away from the Moon.
    #[serde(default = "default_min_moon_angle")]
    pub min_moon_angle: Degrees,
    #[serde(default)]
    pub airmass_model: AirmassModel,
    /// Filled from the `[site]` table.
    #[serde(skip)]
    pub site: Site,
}

impl Default for TacticianConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            mode: default_mode(),
            max_airmass: default_max_airmass(),
            max_hour_angle: default_max_hour_angle(),
            min_moon_angle: default_min_moon_angle(),
            airmass_model: AirmassModel::default(),
            site: Site::default(),
        }
    }
}

impl TacticianConfig {
    pub fn validate(&self) -> Result<()> {
        self.strategy
            .parse::<StrategyKind>()?
            .build(&self.mode, self.min_moon_angle)?;
        if !self.max_airmass.is_finite() || self.max_airmass <= 1.0 {
            return Err(SchedulerError::configuration(format!(
                "max_airmass {} must be a finite value above 1",
                self.max_airmass
            )));
        }
        let ha = self.max_hour_angle.value();
        if !ha.is_finite() || ha <= 0.0 || ha > 180.0 {
            return Err(SchedulerError::configuration(format!(
                "max_hour_angle {} outside (0, 180]",
                ha
            )));
        }
        let moon = self.min_moon_angle.value();
        if !moon.is_finite() || !(0.0..=180.0).contains(&moon) {
            return Err(SchedulerError::configuration(format!(
                "min_moon_angle {} outside [0, 180]",
                moon
            )));
        }
        self.site.validate()
    }
}

/// Sky metrics of one field at the current date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldMetrics {
    pub airmass: Airmass,
    pub hour_angle: Degrees,
    pub moon_angle: Degrees,
    pub slew: Degrees,
}

impl Default for FieldMetrics {
    fn default() -> Self {
        Self {
            airmass: Airmass::BelowHorizon,
            hour_angle: Degrees::new(0.0),
            moon_angle: Degrees::new(0.0),
            slew: Degrees::new(0.0),
        }
    }
}

/// The field chosen by [`Tactician::select_field`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Catalog index of the chosen field.
    pub index: usize,
    pub field_id: FieldId,
    pub score: f64,
    pub metrics: FieldMetrics,
}

/// Scores and filters the catalog at one instant.
#[derive(Debug)]
pub struct Tactician {
    config: TacticianConfig,
    strategy: Box<dyn Strategy>,
    positions: Vec<Equatorial>,
    metrics: Vec<FieldMetrics>,
    sky: Option<SkyState>,
    previous: Option<Equatorial>,
}

impl Tactician {
    /// Builds the strategy named in `config` and snapshots catalog positions.
    pub fn new(catalog: &FieldCatalog, config: TacticianConfig) -> Result<Self> {
        config.validate()?;
        let kind: StrategyKind = config.strategy.parse()?;
        let strategy = kind.build(&config.mode, config.min_moon_angle)?;
        let positions = catalog.positions();
        let metrics = vec![FieldMetrics::default(); positions.len()];

        Ok(Self {
            config,
            strategy,
            positions,
            metrics,
            sky: None,
            previous: None,
        })
    }

    pub fn config(&self) -> &TacticianConfig {
        &self.config
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Recompute airmass, hour angle and moon angle of every field at `time`.
    pub fn set_date(&mut self, time: DateTime<Utc>) {
        let sky = SkyState::at(time, &self.config.site);
        let model = self.config.airmass_model;
        for (metrics, position) in self.metrics.iter_mut().zip(&self.positions) {
            metrics.airmass = airmass_from_zenith(*position, sky.zenith, model);
            metrics.hour_angle = hour_angle_from_zenith(position.ra(), sky.zenith);
            metrics.moon_angle = angular_separation(*position, sky.moon);
        }
        self.sky = Some(sky);
    }

    /// Slew reference from a previously observed field; `None` zeroes all slews.
    pub fn set_previous_field(&mut self, field: Option<&Field>) {
        self.set_previous_position(field.map(Field::position));
    }

    pub fn set_previous_position(&mut self, position: Option<Equatorial>) {
        self.previous = position;
        for (metrics, target) in self.metrics.iter_mut().zip(&self.positions) {
            metrics.slew = match position {
                Some(from) => angular_separation(from, *target),
                None => Degrees::new(0.0),
            };
        }
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.sky.map(|sky| sky.time)
    }

    pub fn previous_position(&self) -> Option<Equatorial> {
        self.previous
    }

    pub fn sky(&self) -> Option<&SkyState> {
        self.sky.as_ref()
    }

    pub fn metrics(&self) -> &[FieldMetrics] {
        &self.metrics
    }

    pub fn airmass(&self) -> Vec<f64> {
        self.metrics.iter().map(|m| m.airmass.value()).collect()
    }

    pub fn hour_angle(&self) -> Vec<f64> {
        self.metrics.iter().map(|m| m.hour_angle.value()).collect()
    }

    pub fn moon_angle(&self) -> Vec<f64> {
        self.metrics.iter().map(|m| m.moon_angle.value()).collect()
    }

    pub fn slew(&self) -> Vec<f64> {
        self.metrics.iter().map(|m| m.slew.value()).collect()
    }

    /// Illuminated fraction of the Moon in percent, once a date is set.
    pub fn moon_phase(&self) -> Option<f64> {
        self.sky.map(|sky| sky.moon_phase)
    }

    pub fn zenith(&self) -> Option<Equatorial> {
        self.sky.map(|sky| sky.zenith)
    }

    fn is_viable(&self, field: &Field, metrics: &FieldMetrics, sky: &SkyState) -> bool {
        if field.is_observed() {
            return false;
        }
        let airmass = match metrics.airmass {
            Airmass::Observable(x) => x,
            Airmass::BelowHorizon => return false,
        };
        if airmass >= self.config.max_airmass {
            return false;
        }
        if metrics.hour_angle.value().abs() >= self.config.max_hour_angle.value() {
            return false;
        }
        if let Some(min_sep) = self.strategy.min_moon_angle() {
            if metrics.moon_angle < min_sep {
                return false;
            }
        }
        self.strategy.admits(field, metrics, sky)
    }

    /// `true` when `catalog` lists the same positions, in the same order, as
    /// the catalog this tactician was built from.
    pub fn matches_catalog(&self, catalog: &FieldCatalog) -> bool {
        catalog.len() == self.positions.len()
            && catalog
                .iter()
                .zip(&self.positions)
                .all(|(field, position)| field.position() == *position)
    }

    /// Per-field viability mask in catalog order.
    ///
    /// Metrics are indexed by the catalog passed to [`Tactician::new`]. The
    /// mask is all false before a date is set, or when `catalog` is not that
    /// catalog (observed flags may differ).
    pub fn viable_fields(&self, catalog: &FieldCatalog) -> Vec<bool> {
        let Some(sky) = self.sky.as_ref() else {
            return vec![false; catalog.len()];
        };
        if !self.matches_catalog(catalog) {
            warn!(
                "Catalog of {} fields does not match the {} positions this tactician tracks",
                catalog.len(),
                self.positions.len()
            );
            return vec![false; catalog.len()];
        }
        catalog
            .iter()
            .enumerate()
            .map(|(index, field)| {
                self.metrics
                    .get(index)
                    .is_some_and(|metrics| self.is_viable(field, metrics, sky))
            })
            .collect()
    }

    /// Pick the best viable field, or `None` when nothing can be observed or
    /// `catalog` is not the one this tactician was built from.
    ///
    /// Lowest score wins; ties go to the smaller slew, then the smaller id.
    pub fn select_field(&self, catalog: &FieldCatalog) -> Option<Selection> {
        let sky = self.sky.as_ref()?;
        let viable = self.viable_fields(catalog);

        let best = catalog
            .iter()
            .enumerate()
            .filter(|(index, _)| viable[*index])
            .map(|(index, field)| {
                let metrics = self.metrics[index];
                Selection {
                    index,
                    field_id: field.id,
                    score: self.strategy.score(field, &metrics, sky),
                    metrics,
                }
            })
            .min_by(compare_selections)?;

        debug!(
            "{} selected field {} (score {:.3}, airmass {:.3}, slew {:.2})",
            self.strategy.name(),
            best.field_id,
            best.score,
            best.metrics.airmass.value(),
            best.metrics.slew.value()
        );
        Some(best)
    }
}

fn compare_selections(a: &Selection, b: &Selection) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.metrics.slew.value().total_cmp(&b.metrics.slew.value()))
        .then_with(|| a.field_id.cmp(&b.field_id))
}
