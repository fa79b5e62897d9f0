use std::path::Path;

use anyhow::Context;

use crate::core::domain::{FieldCatalog, ObservingWindow};
use crate::error::{Result, SchedulerError};
use crate::parsing::{catalog_parser, windows_parser};

/// Represents the on-disk format of an input table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Csv,
}

impl SourceFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                SchedulerError::Parse(format!("{} has no file extension", path.display()))
            })?;

        match extension.to_lowercase().as_str() {
            "json" => Ok(SourceFormat::Json),
            "csv" | "txt" => Ok(SourceFormat::Csv),
            _ => Err(SchedulerError::Parse(format!(
                "Unsupported file format: {}",
                extension
            ))),
        }
    }
}

/// Fail early with the offending path when an input cannot be opened.
fn ensure_readable(path: &Path) -> Result<()> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|source| SchedulerError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Loads field catalogs into validated [`FieldCatalog`]s.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load a catalog table; `default_exptime` (seconds) fills a missing
    /// exposure column.
    pub fn load_from_file(path: &Path, default_exptime: f64) -> Result<FieldCatalog> {
        ensure_readable(path)?;
        match SourceFormat::from_path(path)? {
            SourceFormat::Csv => Ok(catalog_parser::parse_catalog_csv(path, default_exptime)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?),
            SourceFormat::Json => Err(SchedulerError::Parse(format!(
                "catalogs are read from CSV, got {}",
                path.display()
            ))),
        }
    }
}

/// Loads observing windows from CSV or JSON.
pub struct WindowLoader;

impl WindowLoader {
    /// Load windows from a file (auto-detects JSON or CSV)
    pub fn load_from_file(path: &Path) -> Result<Vec<ObservingWindow>> {
        ensure_readable(path)?;
        let windows = match SourceFormat::from_path(path)? {
            SourceFormat::Csv => windows_parser::parse_windows_csv(path),
            SourceFormat::Json => windows_parser::parse_windows_json(path),
        }
        .with_context(|| format!("Failed to load windows {}", path.display()))?;

        Ok(windows)
    }

    /// Load windows from a JSON string
    pub fn load_from_json_str(json_str: &str) -> Result<Vec<ObservingWindow>> {
        Ok(windows_parser::parse_windows_str(json_str)?)
    }
}
