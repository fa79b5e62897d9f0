//! Time handling: Modified Julian Dates and UTC timestamp parsing.

pub mod mjd;

pub use mjd::{
    format_utc, julian_centuries, julian_date, parse_utc, ModifiedJulianDate, MJD_J2000,
};
