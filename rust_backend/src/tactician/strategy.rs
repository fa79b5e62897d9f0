//! Field ranking strategies.
//!
//! A strategy turns per-field metrics into a score (lower is better) and may
//! narrow the set of admissible fields. Strategies are looked up by name
//! through [`StrategyKind`].

use std::fmt;
use std::str::FromStr;

use qtty::Degrees;
use serde::{Deserialize, Serialize};

use super::FieldMetrics;
use crate::astro::SkyState;
use crate::core::domain::{Band, Field};
use crate::error::{Result, SchedulerError};

/// Score added to fields outside a strategy's airmass band.
pub const OUT_OF_BAND_PENALTY: f64 = 1e10;

/// Closed airmass interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirmassBand {
    pub min: f64,
    pub max: f64,
}

impl AirmassBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, airmass: f64) -> bool {
        self.min <= airmass && airmass <= self.max
    }
}

/// Ranking policy plugged into the tactician.
pub trait Strategy: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Score of a viable field. Lower wins.
    fn score(&self, field: &Field, metrics: &FieldMetrics, sky: &SkyState) -> f64;

    /// Extra admission rule applied after the base viability cuts.
    fn admits(&self, _field: &Field, _metrics: &FieldMetrics, _sky: &SkyState) -> bool {
        true
    }

    /// Minimum separation from the Moon, if the strategy enforces one.
    fn min_moon_angle(&self) -> Option<Degrees> {
        None
    }
}

/// Registry of the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Coverage,
    Condition,
    Moon,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Coverage,
        StrategyKind::Condition,
        StrategyKind::Moon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Coverage => "coverage",
            StrategyKind::Condition => "condition",
            StrategyKind::Moon => "moon",
        }
    }

    /// Instantiate the strategy for a condition `mode`.
    pub fn build(&self, mode: &str, min_moon_angle: Degrees) -> Result<Box<dyn Strategy>> {
        let strategy: Box<dyn Strategy> = match self {
            StrategyKind::Coverage => Box::new(CoverageStrategy),
            StrategyKind::Condition => Box::new(ConditionStrategy::new(mode)?),
            StrategyKind::Moon => Box::new(MoonStrategy::new(mode, min_moon_angle)?),
        };
        Ok(strategy)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        StrategyKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| {
                SchedulerError::configuration(format!(
                    "unknown strategy '{}' (expected one of: coverage, condition, moon)",
                    s.trim()
                ))
            })
    }
}

fn tiling_weight(field: &Field) -> f64 {
    f64::from(field.tiling) * 360.0
}

fn priority_bonus(field: &Field) -> f64 {
    360.0 * field.priority
}

/// Sweep the sky tiling by tiling, trailing the meridian.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageStrategy;

impl Strategy for CoverageStrategy {
    fn name(&self) -> &'static str {
        "coverage"
    }

    fn score(&self, field: &Field, metrics: &FieldMetrics, _sky: &SkyState) -> f64 {
        let x = metrics.airmass.value();
        metrics.hour_angle.value()
            + 6.0 * tiling_weight(field)
            + metrics.slew.value().powi(3)
            + 100.0 * (x - 1.0).powi(3)
            - priority_bonus(field)
    }
}

/// Airmass band for a named sky-condition mode.
pub fn condition_band(mode: &str) -> Result<AirmassBand> {
    let band = match mode.trim().to_ascii_lowercase().as_str() {
        "none" => AirmassBand::new(1.0, 2.0),
        "great" => AirmassBand::new(1.6, 2.0),
        "good" | "complete" | "coverage" => AirmassBand::new(0.0, 2.0),
        "fine" => AirmassBand::new(0.0, 1.9),
        "ok" => AirmassBand::new(0.0, 1.6),
        "poor" => AirmassBand::new(0.0, 1.5),
        "bad" => AirmassBand::new(0.0, 1.4),
        other => {
            return Err(SchedulerError::configuration(format!(
                "unknown condition mode '{}'",
                other
            )))
        }
    };
    Ok(band)
}

/// Match the airmass to the current seeing conditions.
#[derive(Debug, Clone, Copy)]
pub struct ConditionStrategy {
    band: AirmassBand,
}

impl ConditionStrategy {
    pub fn new(mode: &str) -> Result<Self> {
        Ok(Self {
            band: condition_band(mode)?,
        })
    }

    pub fn airmass_band(&self) -> AirmassBand {
        self.band
    }
}

impl Strategy for ConditionStrategy {
    fn name(&self) -> &'static str {
        "condition"
    }

    fn score(&self, field: &Field, metrics: &FieldMetrics, _sky: &SkyState) -> f64 {
        let mut score = 2.0 * metrics.hour_angle.value()
            + 3.0 * tiling_weight(field)
            + metrics.slew.value().powi(3)
            - priority_bonus(field);
        if !self.band.contains(metrics.airmass.value()) {
            score += OUT_OF_BAND_PENALTY;
        }
        score
    }
}

/// Airmass band for a named moon-strategy mode.
pub fn moon_band(mode: &str) -> Result<AirmassBand> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "none" | "good" => Ok(AirmassBand::new(1.0, 1.4)),
        "poor" => Ok(AirmassBand::new(1.0, 1.2)),
        other => Err(SchedulerError::configuration(format!(
            "unknown moon mode '{}'",
            other
        ))),
    }
}

/// Bands usable under the current Moon, with the preferred one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoonBands {
    pub allowed: [Band; 2],
    pub preferred: Band,
}

impl MoonBands {
    pub fn for_sky(sky: &SkyState) -> Self {
        let up = sky.moon_is_up();
        if up && sky.moon_phase >= 80.0 {
            MoonBands {
                allowed: [Band::I, Band::Z],
                preferred: Band::Z,
            }
        } else if up && sky.moon_phase >= 45.0 {
            MoonBands {
                allowed: [Band::R, Band::I],
                preferred: Band::I,
            }
        } else {
            MoonBands {
                allowed: [Band::G, Band::R],
                preferred: Band::G,
            }
        }
    }

    pub fn allows(&self, band: Band) -> bool {
        self.allowed.contains(&band)
    }
}

/// Keep away from the Moon and pick the band its brightness allows.
#[derive(Debug, Clone, Copy)]
pub struct MoonStrategy {
    band: AirmassBand,
    min_moon_angle: Degrees,
}

impl MoonStrategy {
    pub fn new(mode: &str, min_moon_angle: Degrees) -> Result<Self> {
        Ok(Self {
            band: moon_band(mode)?,
            min_moon_angle,
        })
    }
}

impl Strategy for MoonStrategy {
    fn name(&self) -> &'static str {
        "moon"
    }

    fn admits(&self, field: &Field, metrics: &FieldMetrics, sky: &SkyState) -> bool {
        self.band.contains(metrics.airmass.value()) && MoonBands::for_sky(sky).allows(field.band)
    }

    fn min_moon_angle(&self) -> Option<Degrees> {
        Some(self.min_moon_angle)
    }

    fn score(&self, field: &Field, metrics: &FieldMetrics, sky: &SkyState) -> f64 {
        let x = metrics.airmass.value();
        let mut score = 6.0 * tiling_weight(field)
            + metrics.slew.value().powi(3)
            + 1000.0 * (x - 1.0).powi(3)
            - priority_bonus(field);
        if field.band != MoonBands::for_sky(sky).preferred {
            score += 100.0;
        }
        score
    }
}
