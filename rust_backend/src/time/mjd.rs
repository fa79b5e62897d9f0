use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// MJD of the J2000.0 epoch (2000-01-01 12:00 TT, treated as UTC here).
pub const MJD_J2000: f64 = 51544.5;

/// Offset between Julian Date and Modified Julian Date.
const JD_MJD_OFFSET: f64 = 2400000.5;

/// MJD of the Unix epoch.
const MJD_UNIX_EPOCH: f64 = 40587.0;

/// Accepted naive (UTC) timestamp layouts, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Modified Julian Date representation.
/// MJD 0 = 1858-11-17 00:00:00 UTC
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ModifiedJulianDate(qtty::Days);

impl ModifiedJulianDate {
    /// Create a new MJD value.
    pub fn new<V: Into<qtty::Days>>(v: V) -> Self {
        Self(v.into())
    }

    /// Raw MJD value as f64.
    pub fn value(&self) -> f64 {
        self.0.value()
    }

    /// Julian Date of this instant.
    pub fn julian_date(&self) -> f64 {
        self.value() + JD_MJD_OFFSET
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn to_unix_timestamp(&self) -> f64 {
        (self.value() - MJD_UNIX_EPOCH) * 86400.0
    }

    /// Create from Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn from_unix_timestamp(timestamp: f64) -> Self {
        Self::new(timestamp / 86400.0 + MJD_UNIX_EPOCH)
    }

    /// Convert to chrono DateTime<Utc>, or `None` when the MJD lies outside
    /// the range chrono can represent.
    pub fn try_to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = self.to_unix_timestamp();
        if !secs.is_finite() {
            return None;
        }
        let floor = secs.floor();
        let nanos = (((secs - floor) * 1e9) as u32).min(999_999_999);
        DateTime::from_timestamp(floor as i64, nanos)
    }

    /// Convert to chrono DateTime<Utc>.
    ///
    /// Out-of-range values clamp to the Unix epoch; use
    /// [`try_to_datetime`](Self::try_to_datetime) for input that is not
    /// already known to be a valid instant.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        self.try_to_datetime().unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Create from chrono DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::from_unix_timestamp(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9)
    }
}

impl From<f64> for ModifiedJulianDate {
    fn from(v: f64) -> Self {
        ModifiedJulianDate::new(v)
    }
}

impl From<DateTime<Utc>> for ModifiedJulianDate {
    fn from(dt: DateTime<Utc>) -> Self {
        ModifiedJulianDate::from_datetime(dt)
    }
}

/// Julian Date of a UTC instant.
pub fn julian_date(time: DateTime<Utc>) -> f64 {
    ModifiedJulianDate::from_datetime(time).julian_date()
}

/// Julian centuries elapsed since J2000.0.
pub fn julian_centuries(time: DateTime<Utc>) -> f64 {
    (ModifiedJulianDate::from_datetime(time).value() - MJD_J2000) / 36525.0
}

/// Parse a UTC timestamp.
///
/// Accepts RFC 3339 (`2017-02-08T04:00:00Z`), the survey's slash layout
/// (`2017/02/08 04:00:00`), dash layouts with or without `T`, and bare MJD
/// numbers (`57792.1666`).
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SchedulerError::Parse("empty timestamp".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(mjd) = trimmed.parse::<f64>() {
        if mjd.is_finite() {
            return ModifiedJulianDate::new(mjd).try_to_datetime().ok_or_else(|| {
                SchedulerError::validation(format!("MJD {} is out of range", trimmed))
            });
        }
    }

    Err(SchedulerError::Parse(format!(
        "unrecognized timestamp '{}'",
        trimmed
    )))
}

/// Format a UTC instant the way chronologies are written (`2017/02/08 04:00:00`).
pub fn format_utc(time: DateTime<Utc>) -> String {
    time.format("%Y/%m/%d %H:%M:%S").to_string()
}
