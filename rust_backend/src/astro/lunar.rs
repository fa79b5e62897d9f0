//! Low-precision Moon and Sun ephemerides (Meeus, Astronomical Algorithms ch. 25 and 47).
//!
//! Positions are geocentric, apparent of date without nutation. That is
//! accurate to roughly a hundredth of a degree for the Moon, far below
//! what the moon-avoidance cuts care about.

use chrono::{DateTime, Utc};
use qtty::Degrees;
use serde::{Deserialize, Serialize};

use super::sidereal::local_sidereal_time;
use super::site::Site;
use super::spherical::Equatorial;
use crate::time::julian_centuries;

const AU_KM: f64 = 149_597_870.7;

/// Periodic terms for longitude and distance: (D, M, M', F, Σl, Σr).
const LONGITUDE_DISTANCE_TERMS: [(i8, i8, i8, i8, f64, f64); 34] = [
    (0, 0, 1, 0, 6288774.0, -20905355.0),
    (2, 0, -1, 0, 1274027.0, -3699111.0),
    (2, 0, 0, 0, 658314.0, -2955968.0),
    (0, 0, 2, 0, 213618.0, -569925.0),
    (0, 1, 0, 0, -185116.0, 48888.0),
    (0, 0, 0, 2, -114332.0, -3149.0),
    (2, 0, -2, 0, 58793.0, 246158.0),
    (2, -1, -1, 0, 57066.0, -152138.0),
    (2, 0, 1, 0, 53322.0, -170733.0),
    (2, -1, 0, 0, 45758.0, -204586.0),
    (0, 1, -1, 0, -40923.0, -129620.0),
    (1, 0, 0, 0, -34720.0, 108743.0),
    (0, 1, 1, 0, -30383.0, 104755.0),
    (2, 0, 0, -2, 15327.0, 10321.0),
    (0, 0, 1, 2, -12528.0, 0.0),
    (0, 0, 1, -2, 10980.0, 79661.0),
    (4, 0, -1, 0, 10675.0, -34782.0),
    (0, 0, 3, 0, 10034.0, -23210.0),
    (4, 0, -2, 0, 8548.0, -21636.0),
    (2, 1, -1, 0, -7888.0, 24208.0),
    (2, 1, 0, 0, -6766.0, 30824.0),
    (1, 0, -1, 0, -5163.0, -8379.0),
    (1, 1, 0, 0, 4987.0, -16675.0),
    (2, -1, 1, 0, 4036.0, -12831.0),
    (2, 0, 2, 0, 3994.0, -10445.0),
    (4, 0, 0, 0, 3861.0, -11650.0),
    (2, 0, -3, 0, 3665.0, 14403.0),
    (0, 1, -2, 0, -2689.0, -7003.0),
    (2, 0, -1, 2, -2602.0, 0.0),
    (2, -1, -2, 0, 2390.0, 10056.0),
    (1, 0, 1, 0, -2348.0, 6322.0),
    (2, -2, 0, 0, 2236.0, -9884.0),
    (0, 1, 2, 0, -2120.0, 5751.0),
    (0, 2, 0, 0, -2069.0, 0.0),
];

/// Periodic terms for latitude: (D, M, M', F, Σb).
const LATITUDE_TERMS: [(i8, i8, i8, i8, f64); 20] = [
    (0, 0, 0, 1, 5128122.0),
    (0, 0, 1, 1, 280602.0),
    (0, 0, 1, -1, 277693.0),
    (2, 0, 0, -1, 173237.0),
    (2, 0, -1, 1, 55413.0),
    (2, 0, -1, -1, 46271.0),
    (2, 0, 0, 1, 32573.0),
    (0, 0, 2, 1, 17198.0),
    (2, 0, 1, -1, 9266.0),
    (0, 0, 2, -1, 8822.0),
    (2, -1, 0, -1, 8216.0),
    (2, 0, -2, -1, 4324.0),
    (2, 0, 1, 1, 4200.0),
    (2, 1, 0, -1, -3359.0),
    (2, -1, -1, 1, 2463.0),
    (2, -1, 0, 1, 2211.0),
    (2, -1, -1, -1, 2065.0),
    (0, 1, -1, -1, -1870.0),
    (4, 0, -1, -1, 1828.0),
    (0, 1, 0, 1, -1794.0),
];

/// Ecliptic position of a body with its geocentric distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipticPosition {
    pub longitude: Degrees,
    pub latitude: Degrees,
    pub distance_km: f64,
}

/// Mean obliquity of the ecliptic (degrees) for `t` Julian centuries.
fn mean_obliquity(t: f64) -> f64 {
    23.439291 - 0.0130042 * t
}

fn ecliptic_to_equatorial(position: &EclipticPosition, t: f64) -> Equatorial {
    let (se, ce) = mean_obliquity(t).to_radians().sin_cos();
    let (sl, cl) = position.longitude.sin_cos();
    let (sb, cb) = position.latitude.sin_cos();
    let v = [cb * cl, cb * sl * ce - sb * se, cb * sl * se + sb * ce];
    Equatorial::from_vector(v)
}

/// Geocentric ecliptic position of the Moon `t` Julian centuries after J2000.0.
pub fn moon_ecliptic(t: f64) -> EclipticPosition {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let l_prime =
        218.3164477 + 481267.88123421 * t - 0.0015786 * t2 + t3 / 538841.0 - t4 / 65194000.0;
    let d = 297.8501921 + 445267.1114034 * t - 0.0018819 * t2 + t3 / 545868.0 - t4 / 113065000.0;
    let m = 357.5291092 + 35999.0502909 * t - 0.0001536 * t2 + t3 / 24490000.0;
    let m_prime =
        134.9633964 + 477198.8675055 * t + 0.0087414 * t2 + t3 / 69699.0 - t4 / 14712000.0;
    let f = 93.2720950 + 483202.0175233 * t - 0.0036539 * t2 - t3 / 3526000.0 + t4 / 863310000.0;

    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let a1 = (119.75 + 131.849 * t).to_radians();
    let a2 = (53.09 + 479264.290 * t).to_radians();
    let a3 = (313.45 + 481266.484 * t).to_radians();

    let (l_rad, d_rad, m_rad, mp_rad, f_rad) = (
        l_prime.to_radians(),
        d.to_radians(),
        m.to_radians(),
        m_prime.to_radians(),
        f.to_radians(),
    );

    // Terms involving M are damped by the eccentricity of Earth's orbit.
    let eccentricity_factor = |cm: i8| e.powi(i32::from(cm.unsigned_abs()));
    let argument = |cd: i8, cm: i8, cmp: i8, cf: i8| {
        f64::from(cd) * d_rad
            + f64::from(cm) * m_rad
            + f64::from(cmp) * mp_rad
            + f64::from(cf) * f_rad
    };

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(cd, cm, cmp, cf, sl, sr) in LONGITUDE_DISTANCE_TERMS.iter() {
        let arg = argument(cd, cm, cmp, cf);
        let factor = eccentricity_factor(cm);
        sum_l += sl * factor * arg.sin();
        sum_r += sr * factor * arg.cos();
    }

    let mut sum_b = 0.0;
    for &(cd, cm, cmp, cf, sb) in LATITUDE_TERMS.iter() {
        sum_b += sb * eccentricity_factor(cm) * argument(cd, cm, cmp, cf).sin();
    }

    sum_l += 3958.0 * a1.sin() + 1962.0 * (l_rad - f_rad).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * l_rad.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - f_rad).sin()
        + 175.0 * (a1 + f_rad).sin()
        + 127.0 * (l_rad - mp_rad).sin()
        - 115.0 * (l_rad + mp_rad).sin();

    EclipticPosition {
        longitude: Degrees::new(l_prime + sum_l / 1.0e6).wrap_pos(),
        latitude: Degrees::new(sum_b / 1.0e6),
        distance_km: 385000.56 + sum_r / 1000.0,
    }
}

/// Geocentric ecliptic position of the Sun `t` Julian centuries after J2000.0.
pub fn sun_ecliptic(t: f64) -> EclipticPosition {
    let t2 = t * t;
    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t2;
    let m = 357.52911 + 35999.05029 * t - 0.0001537 * t2;
    let e = 0.016708634 - 0.000042037 * t - 0.0000001267 * t2;
    let m_rad = m.to_radians();
    let c = (1.914602 - 0.004817 * t - 0.000014 * t2) * m_rad.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m_rad).sin()
        + 0.000289 * (3.0 * m_rad).sin();
    let true_anomaly = (m + c).to_radians();
    let radius_au = 1.000001018 * (1.0 - e * e) / (1.0 + e * true_anomaly.cos());

    EclipticPosition {
        longitude: Degrees::new(l0 + c).wrap_pos(),
        latitude: Degrees::new(0.0),
        distance_km: radius_au * AU_KM,
    }
}

/// Equatorial position of the Moon at `time`.
pub fn moon_position(time: DateTime<Utc>) -> Equatorial {
    let t = julian_centuries(time);
    ecliptic_to_equatorial(&moon_ecliptic(t), t)
}

/// Equatorial position of the Sun at `time`.
pub fn sun_position(time: DateTime<Utc>) -> Equatorial {
    let t = julian_centuries(time);
    ecliptic_to_equatorial(&sun_ecliptic(t), t)
}

/// Illuminated fraction of the lunar disk, in percent (0 new, 100 full).
pub fn moon_phase(time: DateTime<Utc>) -> f64 {
    let t = julian_centuries(time);
    let moon = moon_ecliptic(t);
    let sun = sun_ecliptic(t);

    let elongation = (moon.latitude.cos() * (moon.longitude - sun.longitude).cos()).acos();
    let phase_angle = (sun.distance_km * elongation.sin())
        .atan2(moon.distance_km - sun.distance_km * elongation.cos());
    (1.0 + phase_angle.cos()) / 2.0 * 100.0
}

/// Altitude of the Moon above the horizon at the site.
pub fn moon_altitude(time: DateTime<Utc>, site: &Site) -> Degrees {
    let moon = moon_position(time);
    let hour_angle = local_sidereal_time(time, site) - moon.ra();
    let (slat, clat) = site.latitude.sin_cos();
    let (sdec, cdec) = moon.dec().sin_cos();
    let sin_alt = slat * sdec + clat * cdec * hour_angle.cos();
    Degrees::new(sin_alt.clamp(-1.0, 1.0).asin().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn test_moon_meeus_example() {
        // Meeus example 47.a: 1992 April 12, 0h TD. Only the largest terms
        // are carried, so agreement is to a few thousandths of a degree.
        let t = (2448724.5 - 2451545.0) / 36525.0;
        let moon = moon_ecliptic(t);
        assert_abs_diff_eq!(moon.longitude.value(), 133.162655, epsilon = 0.01);
        assert_abs_diff_eq!(moon.latitude.value(), -3.229126, epsilon = 0.01);
        assert_abs_diff_eq!(moon.distance_km, 368409.7, epsilon = 50.0);
    }

    #[test]
    fn test_sun_meeus_example() {
        // Meeus example 25.a: 1992 October 13, 0h TD
        let t = (2448908.5 - 2451545.0) / 36525.0;
        let sun = sun_ecliptic(t);
        assert_abs_diff_eq!(sun.longitude.value(), 199.90988, epsilon = 1e-4);
        assert_abs_diff_eq!(sun.distance_km / AU_KM, 0.99766, epsilon = 1e-5);
    }

    #[test]
    fn test_moon_phase_survey_night() {
        let t = Utc.with_ymd_and_hms(2017, 2, 8, 4, 0, 0).unwrap();
        assert_abs_diff_eq!(moon_phase(t), 89.82, epsilon = 0.05);
    }

    #[test]
    fn test_moon_above_horizon_survey_night() {
        let t = Utc.with_ymd_and_hms(2017, 2, 8, 4, 0, 0).unwrap();
        let moon = moon_position(t);
        assert_abs_diff_eq!(moon.ra().value(), 103.15, epsilon = 0.1);
        assert_abs_diff_eq!(moon.dec().value(), 18.78, epsilon = 0.1);
        let alt = moon_altitude(t, &Site::blanco());
        assert_abs_diff_eq!(alt.value(), 35.7, epsilon = 0.5);
    }

    #[test]
    fn test_phase_bounds() {
        let start = Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap();
        for day in 0..60 {
            let phase = moon_phase(start + chrono::Duration::hours(12 * day));
            assert!((0.0..=100.0).contains(&phase));
        }
    }
}
