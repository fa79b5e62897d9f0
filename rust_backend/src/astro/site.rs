//! Observatory site description.

use qtty::Degrees;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Geodetic location of the telescope. Longitude is east-positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default = "default_name")]
    pub name: String,
    pub latitude: Degrees,
    pub longitude: Degrees,
    #[serde(default)]
    pub elevation_m: f64,
}

fn default_name() -> String {
    "site".to_string()
}

impl Site {
    pub fn new(name: impl Into<String>, latitude: Degrees, longitude: Degrees, elevation_m: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            elevation_m,
        }
    }

    /// The Blanco 4 m telescope at Cerro Tololo (DECam).
    pub fn blanco() -> Self {
        Self::new(
            "CTIO Blanco",
            Degrees::new(-30.16606),
            Degrees::new(-70.81489),
            2215.0,
        )
    }

    pub fn validate(&self) -> Result<()> {
        let lat = self.latitude.value();
        let lon = self.longitude.value();
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(SchedulerError::configuration(format!(
                "site latitude {} outside [-90, 90]",
                lat
            )));
        }
        if !lon.is_finite() || !(-360.0..=360.0).contains(&lon) {
            return Err(SchedulerError::configuration(format!(
                "site longitude {} outside [-360, 360]",
                lon
            )));
        }
        if !self.elevation_m.is_finite() {
            return Err(SchedulerError::configuration("site elevation is not finite"));
        }
        Ok(())
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::blanco()
    }
}
