//! Parsers for survey input formats.
//!
//! # Parsers
//!
//! - [`catalog_parser`]: field catalogs in CSV form
//! - [`windows_parser`]: observing windows in CSV or JSON form
//!
//! # Example
//!
//! ```no_run
//! use survey_tactician::parsing::catalog_parser::parse_catalog_csv;
//! use std::path::Path;
//!
//! let catalog = parse_catalog_csv(Path::new("fields.csv"), 90.0)
//!     .expect("Failed to parse catalog");
//! println!("{} fields", catalog.len());
//! ```

pub mod catalog_parser;
pub mod windows_parser;

#[cfg(test)]
mod catalog_parser_tests;

pub use catalog_parser::parse_catalog_csv;
pub use windows_parser::{parse_windows_csv, parse_windows_json, parse_windows_str};
