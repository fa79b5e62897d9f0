//! Airmass from zenith angle.

use qtty::Degrees;
use serde::{Deserialize, Serialize};

/// Numeric stand-in for a target at or below the horizon.
pub const AIRMASS_SENTINEL: f64 = 999.0;

/// How the secant of the zenith angle is turned into an airmass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AirmassModel {
    /// Plane-parallel atmosphere, `sec z`.
    #[default]
    Secant,
    /// Hardie (1962) polynomial in `sec z - 1`.
    Hardie,
}

/// Airmass of a position at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Airmass {
    Observable(f64),
    BelowHorizon,
}

impl Airmass {
    /// Airmass for a zenith angle. Never fails; degenerate geometry maps to
    /// [`Airmass::BelowHorizon`].
    pub fn from_zenith_angle(zenith_angle: Degrees, model: AirmassModel) -> Self {
        let z = zenith_angle.value();
        if !z.is_finite() || z.abs() >= 90.0 {
            return Airmass::BelowHorizon;
        }

        let secant = 1.0 / zenith_angle.cos();
        let x = match model {
            AirmassModel::Secant => secant,
            AirmassModel::Hardie => {
                let s1 = secant - 1.0;
                secant - 0.0018167 * s1 - 0.002875 * s1 * s1 - 0.0008083 * s1 * s1 * s1
            }
        };

        if x.is_finite() && x >= 1.0 - 1e-12 {
            Airmass::Observable(x)
        } else {
            Airmass::BelowHorizon
        }
    }

    /// Secant value, or [`AIRMASS_SENTINEL`] below the horizon.
    pub fn value(&self) -> f64 {
        match self {
            Airmass::Observable(x) => *x,
            Airmass::BelowHorizon => AIRMASS_SENTINEL,
        }
    }

    pub fn is_observable(&self) -> bool {
        matches!(self, Airmass::Observable(_))
    }
}

impl From<Airmass> for f64 {
    fn from(airmass: Airmass) -> Self {
        airmass.value()
    }
}
