//! Domain models for survey fields, observing windows and chronologies.
//!
//! A [`FieldCatalog`] is built once from validated [`Field`]s and then only
//! its observed flags change. [`ObservingWindow`]s describe when the
//! telescope may observe, and every decision the scheduler makes is kept as
//! a [`ChronologyEntry`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use qtty::{Degrees, Seconds};
use serde::{Deserialize, Serialize};

use crate::astro::Equatorial;
use crate::error::{Result, SchedulerError};

define_id_type!(i64, FieldId);

/// DECam filter bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "u")]
    U,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "r")]
    R,
    #[serde(rename = "i")]
    I,
    #[serde(rename = "z")]
    Z,
    #[serde(rename = "Y")]
    Y,
    #[serde(rename = "VR")]
    VR,
}

impl Band {
    pub const ALL: [Band; 7] = [Band::U, Band::G, Band::R, Band::I, Band::Z, Band::Y, Band::VR];

    /// Canonical spelling used in catalogs and chronologies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::U => "u",
            Band::G => "g",
            Band::R => "r",
            Band::I => "i",
            Band::Z => "z",
            Band::Y => "Y",
            Band::VR => "VR",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = SchedulerError;

    /// Case-insensitive; surrounding whitespace is ignored.
    ///
    /// ```
    /// use survey_tactician::core::domain::Band;
    ///
    /// assert_eq!("Z".parse::<Band>().unwrap(), Band::Z);
    /// assert_eq!("vr".parse::<Band>().unwrap(), Band::VR);
    /// assert!("h".parse::<Band>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Band::ALL
            .iter()
            .copied()
            .find(|band| band.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SchedulerError::validation(format!("unknown filter band '{}'", trimmed)))
    }
}

/// A candidate pointing: one position observed in one band at one tiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub ra: Degrees,
    pub dec: Degrees,
    pub band: Band,
    pub tiling: u32,
    pub priority: f64,
    pub exposure: Seconds,
    #[serde(default, skip_serializing)]
    observed: bool,
}

impl Field {
    /// Creates a validated, not-yet-observed field.
    ///
    /// Fails with [`SchedulerError::DataValidation`] for non-finite or
    /// out-of-range coordinates, a negative priority or a non-positive
    /// exposure.
    pub fn new(
        id: FieldId,
        ra: Degrees,
        dec: Degrees,
        band: Band,
        tiling: u32,
        priority: f64,
        exposure: Seconds,
    ) -> Result<Self> {
        let field = Self {
            id,
            ra,
            dec,
            band,
            tiling,
            priority,
            exposure,
            observed: false,
        };
        field.validate()?;
        Ok(field)
    }

    fn validate(&self) -> Result<()> {
        let ra = self.ra.value();
        let dec = self.dec.value();
        if !ra.is_finite() || !(0.0..360.0).contains(&ra) {
            return Err(SchedulerError::validation(format!(
                "field {}: right ascension {} outside [0, 360)",
                self.id, ra
            )));
        }
        if !dec.is_finite() || !(-90.0..=90.0).contains(&dec) {
            return Err(SchedulerError::validation(format!(
                "field {}: declination {} outside [-90, 90]",
                self.id, dec
            )));
        }
        if !self.priority.is_finite() || self.priority < 0.0 {
            return Err(SchedulerError::validation(format!(
                "field {}: priority {} must be a non-negative number",
                self.id, self.priority
            )));
        }
        let exposure = self.exposure.value();
        if !exposure.is_finite() || exposure <= 0.0 {
            return Err(SchedulerError::validation(format!(
                "field {}: exposure {} s must be positive",
                self.id, exposure
            )));
        }
        Ok(())
    }

    pub fn position(&self) -> Equatorial {
        Equatorial::new(self.ra, self.dec)
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }
}

/// Ordered, fixed-size collection of fields.
///
/// Index order is the catalog order; ids are unique and so is every
/// (position, band, tiling) combination.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<Field>,
    by_id: HashMap<FieldId, usize>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(fields.len());
        let mut identities = HashSet::with_capacity(fields.len());

        for (index, field) in fields.iter().enumerate() {
            field.validate()?;
            if by_id.insert(field.id, index).is_some() {
                return Err(SchedulerError::validation(format!(
                    "duplicate field id {}",
                    field.id
                )));
            }
            let identity = (
                field.ra.value().to_bits(),
                field.dec.value().to_bits(),
                field.band,
                field.tiling,
            );
            if !identities.insert(identity) {
                return Err(SchedulerError::validation(format!(
                    "field {} repeats position ({}, {}) in band {} at tiling {}",
                    field.id,
                    field.ra.value(),
                    field.dec.value(),
                    field.band,
                    field.tiling
                )));
            }
        }

        Ok(Self { fields, by_id })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn index_of(&self, id: FieldId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn get_by_id(&self, id: FieldId) -> Option<&Field> {
        self.index_of(id).map(|i| &self.fields[i])
    }

    /// Mask of fields not yet observed, in catalog order.
    pub fn remaining(&self) -> Vec<bool> {
        self.fields.iter().map(|f| !f.observed).collect()
    }

    pub fn remaining_count(&self) -> usize {
        self.fields.iter().filter(|f| !f.observed).count()
    }

    pub fn mark_observed(&mut self, id: FieldId) -> Result<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| SchedulerError::validation(format!("unknown field id {}", id)))?;
        self.fields[index].observed = true;
        Ok(())
    }

    /// Positions of every field, in catalog order.
    pub fn positions(&self) -> Vec<Equatorial> {
        self.fields.iter().map(Field::position).collect()
    }
}

impl<'a> IntoIterator for &'a FieldCatalog {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Which part of the night a window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NightClass {
    #[default]
    Full,
    First,
    Second,
}

impl NightClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            NightClass::Full => "full",
            NightClass::First => "first",
            NightClass::Second => "second",
        }
    }
}

impl fmt::Display for NightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NightClass {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "full" => Ok(NightClass::Full),
            "first" | "first half" | "first_half" => Ok(NightClass::First),
            "second" | "second half" | "second_half" => Ok(NightClass::Second),
            other => Err(SchedulerError::validation(format!(
                "unknown night classification '{}'",
                other
            ))),
        }
    }
}

/// A span of time during which the telescope may observe.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use survey_tactician::core::domain::{NightClass, ObservingWindow};
///
/// let start = Utc.with_ymd_and_hms(2017, 2, 8, 0, 30, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2017, 2, 8, 9, 0, 0).unwrap();
/// let window = ObservingWindow::new(start, end, NightClass::Full).unwrap();
/// assert_eq!(window.duration().num_minutes(), 510);
/// assert!(ObservingWindow::new(end, start, NightClass::Full).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservingWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    classification: NightClass,
}

impl ObservingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, classification: NightClass) -> Result<Self> {
        if start >= end {
            return Err(SchedulerError::validation(format!(
                "window end {} is not after start {}",
                end, start
            )));
        }
        Ok(Self {
            start,
            end,
            classification,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn classification(&self) -> NightClass {
        self.classification
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }
}

/// One scheduling decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronologyEntry {
    pub field_id: FieldId,
    pub time: DateTime<Utc>,
    pub ra: f64,
    pub dec: f64,
    pub filter: Band,
    pub tiling: u32,
    pub airmass: f64,
    pub hour_angle: f64,
    pub slew: f64,
    pub moon_angle: f64,
    pub moon_phase: f64,
    pub exptime: f64,
}

impl ChronologyEntry {
    pub fn position(&self) -> Equatorial {
        Equatorial::from_degrees(self.ra, self.dec)
    }
}

/// Append-only, time-ordered list of decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chronology {
    entries: Vec<ChronologyEntry>,
}

impl Chronology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Entries must arrive in non-decreasing time order.
    pub fn push(&mut self, entry: ChronologyEntry) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if entry.time < last.time {
                return Err(SchedulerError::validation(format!(
                    "chronology entry at {} precedes previous entry at {}",
                    entry.time, last.time
                )));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[ChronologyEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChronologyEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChronologyEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn field(id: i64, ra: f64, dec: f64, band: Band, tiling: u32) -> Result<Field> {
        Field::new(
            FieldId::new(id),
            Degrees::new(ra),
            Degrees::new(dec),
            band,
            tiling,
            1.0,
            Seconds::new(90.0),
        )
    }

    #[test]
    fn test_band_parsing() {
        assert_eq!("g".parse::<Band>().unwrap(), Band::G);
        assert_eq!(" I ".parse::<Band>().unwrap(), Band::I);
        assert_eq!("y".parse::<Band>().unwrap(), Band::Y);
        assert_eq!(Band::VR.to_string(), "VR");
        assert!("x".parse::<Band>().unwrap_err().is_validation());
    }

    #[test]
    fn test_field_rejects_bad_coordinates() {
        assert!(field(1, 360.0, 0.0, Band::G, 1).is_err());
        assert!(field(1, -0.5, 0.0, Band::G, 1).is_err());
        assert!(field(1, 10.0, 90.5, Band::G, 1).is_err());
        assert!(field(1, f64::NAN, 0.0, Band::G, 1).is_err());
        assert!(field(1, 0.0, -90.0, Band::G, 1).is_ok());
    }

    #[test]
    fn test_field_rejects_bad_exposure_and_priority() {
        let bad_exposure = Field::new(
            FieldId::new(1),
            Degrees::new(1.0),
            Degrees::new(1.0),
            Band::R,
            1,
            1.0,
            Seconds::new(0.0),
        );
        assert!(bad_exposure.unwrap_err().is_validation());
        let bad_priority = Field::new(
            FieldId::new(1),
            Degrees::new(1.0),
            Degrees::new(1.0),
            Band::R,
            1,
            -1.0,
            Seconds::new(90.0),
        );
        assert!(bad_priority.is_err());
    }

    #[test]
    fn test_catalog_uniqueness() {
        let a = field(1, 10.0, -20.0, Band::G, 1).unwrap();
        let b = field(1, 11.0, -20.0, Band::G, 1).unwrap();
        assert!(FieldCatalog::new(vec![a.clone(), b]).is_err());

        let c = field(2, 10.0, -20.0, Band::G, 1).unwrap();
        assert!(FieldCatalog::new(vec![a.clone(), c]).is_err());

        // Same position, other tiling or band: distinct fields
        let d = field(3, 10.0, -20.0, Band::G, 2).unwrap();
        let e = field(4, 10.0, -20.0, Band::R, 1).unwrap();
        let catalog = FieldCatalog::new(vec![a, d, e]).unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_catalog_mark_observed() {
        let fields = vec![
            field(10, 10.0, -20.0, Band::G, 1).unwrap(),
            field(11, 20.0, -20.0, Band::G, 1).unwrap(),
        ];
        let mut catalog = FieldCatalog::new(fields).unwrap();
        assert_eq!(catalog.remaining(), vec![true, true]);

        catalog.mark_observed(FieldId::new(11)).unwrap();
        assert_eq!(catalog.remaining(), vec![true, false]);
        assert_eq!(catalog.remaining_count(), 1);
        assert!(catalog.get_by_id(FieldId::new(11)).unwrap().is_observed());
        assert!(catalog.mark_observed(FieldId::new(99)).is_err());
    }

    #[test]
    fn test_night_class_parsing() {
        assert_eq!("FULL".parse::<NightClass>().unwrap(), NightClass::Full);
        assert_eq!("second".parse::<NightClass>().unwrap(), NightClass::Second);
        assert_eq!("first half".parse::<NightClass>().unwrap(), NightClass::First);
        assert!("third".parse::<NightClass>().is_err());
    }

    #[test]
    fn test_chronology_is_time_ordered() {
        let t0 = Utc.with_ymd_and_hms(2017, 2, 8, 4, 0, 0).unwrap();
        let entry = |time| ChronologyEntry {
            field_id: FieldId::new(1),
            time,
            ra: 0.0,
            dec: 0.0,
            filter: Band::G,
            tiling: 1,
            airmass: 1.0,
            hour_angle: 0.0,
            slew: 0.0,
            moon_angle: 90.0,
            moon_phase: 50.0,
            exptime: 90.0,
        };
        let mut chronology = Chronology::new();
        chronology.push(entry(t0)).unwrap();
        chronology.push(entry(t0)).unwrap();
        assert!(chronology.push(entry(t0 - chrono::Duration::seconds(1))).is_err());
        assert_eq!(chronology.len(), 2);
    }
}
