//! Sky geometry for a ground-based observer.
//!
//! Everything here is a pure function of time, site and sky position.
//! Angles cross the module boundary as [`qtty::Degrees`]; radians only
//! appear inside the computations.

pub mod airmass;
pub mod lunar;
pub mod sidereal;
pub mod site;
pub mod spherical;

use chrono::{DateTime, Utc};
use qtty::Degrees;

pub use airmass::{Airmass, AirmassModel, AIRMASS_SENTINEL};
pub use lunar::{moon_altitude, moon_phase, moon_position, sun_position};
pub use sidereal::{
    greenwich_mean_sidereal_time, hour_angle, hour_angle_from_zenith, local_sidereal_time,
    zenith_position,
};
pub use site::Site;
pub use spherical::{angular_separation, Equatorial};

/// Airmass of `position` at `time`.
pub fn airmass(
    position: Equatorial,
    time: DateTime<Utc>,
    site: &Site,
    model: AirmassModel,
) -> Airmass {
    airmass_from_zenith(position, zenith_position(time, site), model)
}

/// Airmass of `position` relative to a precomputed zenith.
pub fn airmass_from_zenith(position: Equatorial, zenith: Equatorial, model: AirmassModel) -> Airmass {
    Airmass::from_zenith_angle(angular_separation(position, zenith), model)
}

/// Angular distance between `position` and the Moon.
pub fn moon_angle(position: Equatorial, time: DateTime<Utc>) -> Degrees {
    angular_separation(position, moon_position(time))
}

/// Scalar sky quantities shared by every field at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyState {
    pub time: DateTime<Utc>,
    pub zenith: Equatorial,
    pub moon: Equatorial,
    pub moon_phase: f64,
    pub moon_altitude: Degrees,
}

impl SkyState {
    pub fn at(time: DateTime<Utc>, site: &Site) -> Self {
        Self {
            time,
            zenith: zenith_position(time, site),
            moon: moon_position(time),
            moon_phase: moon_phase(time),
            moon_altitude: moon_altitude(time, site),
        }
    }

    /// Whether the Moon is above the horizon.
    pub fn moon_is_up(&self) -> bool {
        self.moon_altitude.value() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn reference_positions() -> Vec<Equatorial> {
        (0..10i32)
            .map(|i| {
                let i = f64::from(i);
                Equatorial::from_degrees(3.0 + 356.0 * i / 9.0, -89.0 + 178.0 * i / 9.0)
            })
            .collect()
    }

    fn survey_epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 2, 8, 4, 0, 0).unwrap()
    }

    #[test]
    fn test_reference_hour_angles() {
        let expected = [
            -124.4676116,
            -84.9120560,
            -45.3565005,
            -5.8009449,
            33.7546106,
            73.3101662,
            112.8657217,
            152.4212773,
            -168.0231671,
            -128.4676116,
        ];
        let site = Site::blanco();
        for (pos, want) in reference_positions().into_iter().zip(expected) {
            let ha = hour_angle(pos.ra(), survey_epoch(), &site);
            assert_abs_diff_eq!(ha.value(), want, epsilon = 0.01);
        }
    }

    #[test]
    fn test_reference_airmass() {
        let expected = [2.0283, 2.0152, 1.2880, 1.0039, 1.2583, 6.3051];
        let site = Site::blanco();
        let positions = reference_positions();
        for (pos, want) in positions.iter().zip(expected) {
            let x = airmass(*pos, survey_epoch(), &site, AirmassModel::Secant);
            assert_abs_diff_eq!(x.value(), want, epsilon = 0.002 * want);
        }
        for pos in &positions[6..] {
            let x = airmass(*pos, survey_epoch(), &site, AirmassModel::Secant);
            assert_eq!(x, Airmass::BelowHorizon);
        }
    }

    #[test]
    fn test_reference_moon_angles() {
        let expected = [
            108.9487001,
            97.8196126,
            70.7322332,
            51.6236834,
            64.0174593,
            93.9227775,
            116.3650182,
            111.7185502,
            88.2697742,
            71.4721274,
        ];
        for (pos, want) in reference_positions().into_iter().zip(expected) {
            assert_abs_diff_eq!(moon_angle(pos, survey_epoch()).value(), want, epsilon = 0.05);
        }
    }

    #[test]
    fn test_sky_state_snapshot() {
        let sky = SkyState::at(survey_epoch(), &Site::blanco());
        assert!(sky.moon_is_up());
        assert_abs_diff_eq!(sky.moon_phase, 89.82, epsilon = 0.05);
        assert_abs_diff_eq!(sky.zenith.dec().value(), -30.108, epsilon = 0.01);
    }
}
