//! Sidereal time, precession and the zenith point.

use chrono::{DateTime, Utc};
use qtty::Degrees;

use super::site::Site;
use super::spherical::Equatorial;
use crate::time::{julian_centuries, julian_date};

const ARCSEC_PER_DEGREE: f64 = 3600.0;

/// Greenwich mean sidereal time (IAU 1982, Meeus eq. 12.4) for a UT Julian Date.
pub fn greenwich_mean_sidereal_time(jd: f64) -> Degrees {
    let d = jd - 2451545.0;
    let t = d / 36525.0;
    let gmst = 280.46061837 + 360.98564736629 * d + 0.000387933 * t * t - t * t * t / 38710000.0;
    Degrees::new(gmst).wrap_pos()
}

/// Local mean sidereal time at the site.
pub fn local_sidereal_time(time: DateTime<Utc>, site: &Site) -> Degrees {
    (greenwich_mean_sidereal_time(julian_date(time)) + site.longitude).wrap_pos()
}

/// Frame rotation about the z axis.
fn rotate_z(angle: f64, v: [f64; 3]) -> [f64; 3] {
    let (s, c) = angle.sin_cos();
    [c * v[0] + s * v[1], -s * v[0] + c * v[1], v[2]]
}

/// Frame rotation about the y axis.
fn rotate_y(angle: f64, v: [f64; 3]) -> [f64; 3] {
    let (s, c) = angle.sin_cos();
    [c * v[0] - s * v[2], v[1], s * v[0] + c * v[2]]
}

/// Precess a mean position of date back to the J2000.0 equinox (IAU 1976).
///
/// `t` is Julian centuries since J2000.0 of the epoch the position refers to.
pub fn precess_to_j2000(position: Equatorial, t: f64) -> Equatorial {
    let t2 = t * t;
    let t3 = t2 * t;
    let zeta = (2306.2181 * t + 0.30188 * t2 + 0.017998 * t3) / ARCSEC_PER_DEGREE;
    let z = (2306.2181 * t + 1.09468 * t2 + 0.018203 * t3) / ARCSEC_PER_DEGREE;
    let theta = (2004.3109 * t - 0.42665 * t2 - 0.041833 * t3) / ARCSEC_PER_DEGREE;

    // Inverse of R3(-z) R2(theta) R3(-zeta)
    let v = position.to_unit_vector();
    let v = rotate_z(z.to_radians(), v);
    let v = rotate_y(-theta.to_radians(), v);
    let v = rotate_z(zeta.to_radians(), v);
    Equatorial::from_vector(v)
}

/// The point directly overhead at the site, referred to J2000.0.
pub fn zenith_position(time: DateTime<Utc>, site: &Site) -> Equatorial {
    let of_date = Equatorial::new(local_sidereal_time(time, site), site.latitude);
    precess_to_j2000(of_date, julian_centuries(time))
}

/// Hour angle of `ra` relative to a precomputed zenith.
///
/// Survey convention: `ra - zenith_ra`, wrapped to (-180, 180].
pub fn hour_angle_from_zenith(ra: Degrees, zenith: Equatorial) -> Degrees {
    (ra - zenith.ra()).wrap_signed()
}

/// Hour angle of `ra` at `time`.
pub fn hour_angle(ra: Degrees, time: DateTime<Utc>, site: &Site) -> Degrees {
    hour_angle_from_zenith(ra, zenith_position(time, site))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn survey_epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 2, 8, 4, 0, 0).unwrap()
    }

    #[test]
    fn test_gmst_meeus_example() {
        // Meeus example 12.a: 1987 April 10, 0h UT -> 13h10m46.3668s
        let gmst = greenwich_mean_sidereal_time(2446895.5);
        assert_abs_diff_eq!(gmst.value(), 197.693195, epsilon = 1e-5);
    }

    #[test]
    fn test_precession_is_identity_at_j2000() {
        let p = Equatorial::from_degrees(41.054063, 49.227750);
        let q = precess_to_j2000(p, 0.0);
        assert_abs_diff_eq!(q.ra().value(), p.ra().value(), epsilon = 1e-10);
        assert_abs_diff_eq!(q.dec().value(), p.dec().value(), epsilon = 1e-10);
    }

    #[test]
    fn test_precession_meeus_example() {
        // Meeus example 21.b run backwards: theta Persei, mean of 2028 Nov 13.19
        let of_date = Equatorial::from_degrees(41.547214, 49.348483);
        let t = (2462088.69 - 2451545.0) / 36525.0;
        let j2000 = precess_to_j2000(of_date, t);
        assert_abs_diff_eq!(j2000.ra().value(), 41.054063, epsilon = 1e-4);
        assert_abs_diff_eq!(j2000.dec().value(), 49.227750, epsilon = 1e-4);
    }

    #[test]
    fn test_zenith_at_blanco() {
        let zenith = zenith_position(survey_epoch(), &Site::blanco());
        assert_abs_diff_eq!(zenith.ra().value(), 127.4676116, epsilon = 0.01);
        assert_abs_diff_eq!(zenith.dec().value(), -30.1083384, epsilon = 0.01);
    }

    #[test]
    fn test_hour_angle_wraps() {
        let zenith = Equatorial::from_degrees(127.4676, -30.1);
        let ha = hour_angle_from_zenith(Degrees::new(319.4444), zenith);
        assert_abs_diff_eq!(ha.value(), -168.0232, epsilon = 1e-3);
        let zenith = Equatorial::from_degrees(127.5, -30.1);
        let ha = hour_angle_from_zenith(Degrees::new(307.5), zenith);
        assert_abs_diff_eq!(ha.value(), 180.0, epsilon = 1e-9);
    }
}
