//! Equatorial positions and great-circle geometry.

use qtty::{Degrees, Radian};
use serde::{Deserialize, Serialize};

/// A point on the celestial sphere (right ascension, declination).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    ra: Degrees,
    dec: Degrees,
}

impl Equatorial {
    pub fn new(ra: Degrees, dec: Degrees) -> Self {
        Self { ra, dec }
    }

    pub fn from_degrees(ra: f64, dec: f64) -> Self {
        Self::new(Degrees::new(ra), Degrees::new(dec))
    }

    pub fn ra(&self) -> Degrees {
        self.ra
    }

    pub fn dec(&self) -> Degrees {
        self.dec
    }

    /// Unit vector in the equatorial frame.
    pub(crate) fn to_unit_vector(self) -> [f64; 3] {
        let (sa, ca) = self.ra.to::<Radian>().value().sin_cos();
        let (sd, cd) = self.dec.to::<Radian>().value().sin_cos();
        [cd * ca, cd * sa, sd]
    }

    /// Inverse of [`Self::to_unit_vector`]; the vector need not be normalized.
    pub(crate) fn from_vector(v: [f64; 3]) -> Self {
        let ra = v[1].atan2(v[0]).to_degrees();
        let dec = v[2].atan2(v[0].hypot(v[1])).to_degrees();
        Self::new(Degrees::new(ra).wrap_pos(), Degrees::new(dec))
    }
}

/// Great-circle distance between two positions.
///
/// Uses the Vincenty form, which stays accurate for both tiny and
/// near-antipodal separations. The arguments are put in a canonical order
/// first so the result is bit-for-bit symmetric.
pub fn angular_separation(a: Equatorial, b: Equatorial) -> Degrees {
    let (p, q) = if (a.ra.value(), a.dec.value()) <= (b.ra.value(), b.dec.value()) {
        (a, b)
    } else {
        (b, a)
    };

    let d_ra = (q.ra - p.ra).to::<Radian>().value();
    let (s1, c1) = p.dec.to::<Radian>().value().sin_cos();
    let (s2, c2) = q.dec.to::<Radian>().value().sin_cos();
    let (s_dra, c_dra) = d_ra.sin_cos();

    let num1 = c2 * s_dra;
    let num2 = c1 * s2 - s1 * c2 * c_dra;
    let denominator = s1 * s2 + c1 * c2 * c_dra;

    Degrees::new(num1.hypot(num2).atan2(denominator).to_degrees())
}
