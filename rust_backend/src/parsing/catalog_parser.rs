use anyhow::{Context, Result};
use polars::prelude::*;
use qtty::{Degrees, Seconds};
use std::path::Path;

use crate::core::domain::{Band, Field, FieldCatalog, FieldId};
use crate::error::SchedulerError;

/// Accepted header spellings, matched case-insensitively.
///
/// `HEX` is not an id spelling: one hex is shared by every band and tiling
/// pointed at it, so it cannot identify a field.
const ID_COLUMNS: &[&str] = &["id", "field_id", "fieldid"];
const RA_COLUMNS: &[&str] = &["ra", "ra_deg", "raindeg"];
const DEC_COLUMNS: &[&str] = &["dec", "dec_deg", "decindeg"];
const FILTER_COLUMNS: &[&str] = &["filter", "band"];
const TILING_COLUMNS: &[&str] = &["tiling", "tile"];
const PRIORITY_COLUMNS: &[&str] = &["priority"];
const EXPTIME_COLUMNS: &[&str] = &["exptime", "exposure", "exptime_s"];

/// Default priority for catalogs without a priority column.
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// Parse a field catalog CSV into a Polars DataFrame.
pub fn read_catalog_csv(csv_path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(csv_path.into()))?
        .finish()
        .with_context(|| format!("Failed to parse catalog CSV {}", csv_path.display()))?;
    Ok(df)
}

/// Parse a field catalog CSV into a validated [`FieldCatalog`].
///
/// `default_exptime` (seconds) fills rows without an exposure time.
pub fn parse_catalog_csv(csv_path: &Path, default_exptime: f64) -> Result<FieldCatalog> {
    let df = read_catalog_csv(csv_path)?;
    dataframe_to_catalog(&df, default_exptime)
}

/// Resolve the actual column name for one of several accepted spellings.
fn find_column(df: &DataFrame, candidates: &[&str]) -> Option<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.as_str())
        .find(|name| {
            candidates
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(name.trim()))
        })
        .map(|name| name.to_string())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df
        .column(name)?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    Ok(column.f64()?.clone())
}

fn string_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let column = df
        .column(name)?
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as text", name))?;
    Ok(column.str()?.clone())
}

fn required_column(df: &DataFrame, candidates: &[&str]) -> Result<String> {
    find_column(df, candidates).ok_or_else(|| {
        SchedulerError::validation(format!(
            "catalog is missing a '{}' column",
            candidates[0]
        ))
        .into()
    })
}

fn required_value<T>(value: Option<T>, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| {
        SchedulerError::validation(format!("missing {} at row {}", column, row)).into()
    })
}

/// Catalog columns resolved against one DataFrame.
pub struct CatalogColumns {
    ids: Option<Float64Chunked>,
    ra: Float64Chunked,
    dec: Float64Chunked,
    filters: StringChunked,
    tilings: Float64Chunked,
    priorities: Option<Float64Chunked>,
    exptimes: Option<Float64Chunked>,
    height: usize,
}

impl CatalogColumns {
    /// Resolve the required and optional catalog columns.
    pub fn resolve(df: &DataFrame) -> Result<Self> {
        let optional = |candidates: &[&str]| {
            find_column(df, candidates)
                .map(|name| float_column(df, &name))
                .transpose()
        };

        Ok(Self {
            ra: float_column(df, &required_column(df, RA_COLUMNS)?)?,
            dec: float_column(df, &required_column(df, DEC_COLUMNS)?)?,
            filters: string_column(df, &required_column(df, FILTER_COLUMNS)?)?,
            tilings: float_column(df, &required_column(df, TILING_COLUMNS)?)?,
            ids: optional(ID_COLUMNS)?,
            priorities: optional(PRIORITY_COLUMNS)?,
            exptimes: optional(EXPTIME_COLUMNS)?,
            height: df.height(),
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Build and validate the field on one row. Ids default to the row index.
    pub fn field_at(&self, row: usize, default_exptime: f64) -> Result<Field> {
        let id = match &self.ids {
            Some(column) => {
                let raw = required_value(column.get(row), "id", row)?;
                if raw.fract() != 0.0 {
                    return Err(SchedulerError::validation(format!(
                        "non-integer id {} at row {}",
                        raw, row
                    ))
                    .into());
                }
                raw as i64
            }
            None => row as i64,
        };

        let band: Band = required_value(self.filters.get(row), "filter", row)?
            .parse()
            .with_context(|| format!("Invalid filter at row {}", row))?;

        let tiling = required_value(self.tilings.get(row), "tiling", row)?;
        if tiling.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&tiling) {
            return Err(SchedulerError::validation(format!(
                "tiling {} at row {} is not a non-negative integer",
                tiling, row
            ))
            .into());
        }

        let field = Field::new(
            FieldId::new(id),
            Degrees::new(required_value(self.ra.get(row), "ra", row)?),
            Degrees::new(required_value(self.dec.get(row), "dec", row)?),
            band,
            tiling as u32,
            self.priorities
                .as_ref()
                .and_then(|column| column.get(row))
                .unwrap_or(DEFAULT_PRIORITY),
            Seconds::new(
                self.exptimes
                    .as_ref()
                    .and_then(|column| column.get(row))
                    .unwrap_or(default_exptime),
            ),
        )?;
        Ok(field)
    }
}

/// Convert a catalog DataFrame to validated fields.
pub fn dataframe_to_catalog(df: &DataFrame, default_exptime: f64) -> Result<FieldCatalog> {
    let columns = CatalogColumns::resolve(df)?;
    let fields = (0..columns.height())
        .map(|row| columns.field_at(row, default_exptime))
        .collect::<Result<Vec<_>>>()?;

    Ok(FieldCatalog::new(fields)?)
}
