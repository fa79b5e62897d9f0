//! Catalog validation with detailed error and warning reporting.
//!
//! Loading a catalog stops at the first bad row. The validator instead walks
//! every row and collects all problems, so a survey planner can fix a
//! catalog in one pass. It also flags fields that are well formed but can
//! never be scheduled from the configured site.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use log::warn;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::astro::Site;
use crate::core::domain::{Field, FieldId};
use crate::parsing::catalog_parser::{read_catalog_csv, CatalogColumns};

/// Only this many per-row messages of each kind are listed.
const MAX_LISTED: usize = 20;

/// Validation outcome with categorized issues and statistics.
///
/// Errors make `is_valid` false; warnings are informational.
///
/// ```
/// use survey_tactician::preprocessing::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_error("duplicate field id 4".to_string());
/// assert!(!result.is_valid);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

/// Summary statistics computed during validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_rows: usize,
    pub valid_fields: usize,
    pub invalid_rows: usize,
    pub duplicate_ids: usize,
    pub duplicate_positions: usize,
    /// Fields whose best airmass from the site is still too high.
    pub never_viable: usize,
    pub fields_per_band: BTreeMap<String, usize>,
    pub max_tiling: u32,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        if self.errors.len() < MAX_LISTED {
            self.errors.push(error);
        }
    }

    pub fn add_warning(&mut self, warning: String) {
        if self.warnings.len() < MAX_LISTED {
            self.warnings.push(warning);
        }
    }
}

/// Validator for field catalogs.
#[derive(Debug, Clone)]
pub struct CatalogValidator {
    site: Site,
    max_airmass: f64,
    default_exptime: f64,
}

impl CatalogValidator {
    pub fn new(site: Site, max_airmass: f64, default_exptime: f64) -> Self {
        Self {
            site,
            max_airmass,
            default_exptime,
        }
    }

    /// Validates a catalog CSV file. Unreadable files produce an invalid
    /// result rather than an error.
    pub fn validate_file(&self, path: &Path) -> ValidationResult {
        match read_catalog_csv(path) {
            Ok(df) => self.validate_dataframe(&df),
            Err(e) => {
                let mut result = ValidationResult::new();
                result.add_error(format!("{:#}", e));
                result
            }
        }
    }

    /// Validates every row of a catalog DataFrame.
    pub fn validate_dataframe(&self, df: &DataFrame) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.stats.total_rows = df.height();

        let columns = match CatalogColumns::resolve(df) {
            Ok(columns) => columns,
            Err(e) => {
                result.add_error(format!("{:#}", e));
                return result;
            }
        };

        let mut fields = Vec::with_capacity(columns.height());
        for row in 0..columns.height() {
            match columns.field_at(row, self.default_exptime) {
                Ok(field) => fields.push(field),
                Err(e) => {
                    result.stats.invalid_rows += 1;
                    result.add_error(format!("row {}: {:#}", row, e));
                }
            }
        }

        self.validate_fields(&fields, &mut result);
        if result.stats.invalid_rows > 0 {
            warn!(
                "Catalog has {} invalid rows out of {}",
                result.stats.invalid_rows, result.stats.total_rows
            );
        }
        result
    }

    fn validate_fields(&self, fields: &[Field], result: &mut ValidationResult) {
        let mut ids: HashSet<FieldId> = HashSet::with_capacity(fields.len());
        let mut positions: HashMap<(u64, u64, &str, u32), FieldId> = HashMap::new();
        let best_zenith_angle_limit = (1.0 / self.max_airmass).acos().to_degrees();
        let latitude = self.site.latitude.value();

        for field in fields {
            if !ids.insert(field.id) {
                result.stats.duplicate_ids += 1;
                result.add_error(format!("duplicate field id {}", field.id));
                continue;
            }

            let identity = (
                field.ra.value().to_bits(),
                field.dec.value().to_bits(),
                field.band.as_str(),
                field.tiling,
            );
            if let Some(first) = positions.insert(identity, field.id) {
                result.stats.duplicate_positions += 1;
                result.add_error(format!(
                    "field {} repeats field {} in band {} at tiling {}",
                    field.id, first, field.band, field.tiling
                ));
                continue;
            }

            result.stats.valid_fields += 1;
            *result
                .stats
                .fields_per_band
                .entry(field.band.as_str().to_string())
                .or_default() += 1;
            result.stats.max_tiling = result.stats.max_tiling.max(field.tiling);

            // Best case is transit, where the zenith angle is |dec - latitude|.
            if (field.dec.value() - latitude).abs() >= best_zenith_angle_limit {
                result.stats.never_viable += 1;
                result.add_warning(format!(
                    "field {} at dec {} never gets below airmass {} from {}",
                    field.id,
                    field.dec.value(),
                    self.max_airmass,
                    self.site.name
                ));
            }
            if field.priority == 0.0 {
                result.add_warning(format!("field {} has zero priority", field.id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> CatalogValidator {
        CatalogValidator::new(Site::blanco(), 2.0, 90.0)
    }

    #[test]
    fn test_valid_catalog() {
        let df = df!(
            "id" => [1i64, 2, 3],
            "ra" => [10.0, 20.0, 30.0],
            "dec" => [-30.0, -40.0, -30.0],
            "filter" => ["g", "r", "g"],
            "tiling" => [1i64, 1, 2],
        )
        .unwrap();

        let result = validator().validate_dataframe(&df);
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(result.stats.valid_fields, 3);
        assert_eq!(result.stats.fields_per_band["g"], 2);
        assert_eq!(result.stats.max_tiling, 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_collects_every_bad_row() {
        let df = df!(
            "id" => [1i64, 2, 3, 3],
            "ra" => [400.0, 20.0, 30.0, 31.0],
            "dec" => [-30.0, -95.0, -30.0, -30.0],
            "filter" => ["g", "r", "g", "g"],
            "tiling" => [1i64, 1, 1, 1],
        )
        .unwrap();

        let result = validator().validate_dataframe(&df);
        assert!(!result.is_valid);
        assert_eq!(result.stats.invalid_rows, 2);
        assert_eq!(result.stats.duplicate_ids, 1);
        assert_eq!(result.stats.valid_fields, 1);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_duplicate_positions() {
        let df = df!(
            "id" => [1i64, 2],
            "ra" => [10.0, 10.0],
            "dec" => [-30.0, -30.0],
            "filter" => ["i", "i"],
            "tiling" => [1i64, 1],
        )
        .unwrap();

        let result = validator().validate_dataframe(&df);
        assert_eq!(result.stats.duplicate_positions, 1);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_never_viable_is_a_warning() {
        // Blanco sits at -30.17; airmass 2 needs a zenith angle below 60.
        let df = df!(
            "ra" => [10.0],
            "dec" => [45.0],
            "filter" => ["z"],
            "tiling" => [1i64],
        )
        .unwrap();

        let result = validator().validate_dataframe(&df);
        assert!(result.is_valid);
        assert_eq!(result.stats.never_viable, 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let df = df!("ra" => [10.0], "dec" => [-30.0]).unwrap();
        let result = validator().validate_dataframe(&df);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("filter"));
    }

    #[test]
    fn test_unreadable_file() {
        let result = validator().validate_file(Path::new("/nonexistent/catalog.csv"));
        assert!(!result.is_valid);
        assert_eq!(result.stats.total_rows, 0);
    }
}
