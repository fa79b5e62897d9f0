//! File loading and writing.
//!
//! Loaders pick a parser from the file extension and attach the path to any
//! failure. Writers turn a finished chronology back into CSV or JSON.
//!
//! # Example
//!
//! ```no_run
//! use survey_tactician::io::{CatalogLoader, WindowLoader};
//! use std::path::Path;
//!
//! let catalog = CatalogLoader::load_from_file(Path::new("fields.csv"), 90.0)?;
//! let windows = WindowLoader::load_from_file(Path::new("nights.json"))?;
//! println!("{} fields, {} nights", catalog.len(), windows.len());
//! # Ok::<(), survey_tactician::error::SchedulerError>(())
//! ```

pub mod loaders;
pub mod writers;

#[cfg(test)]
mod loaders_tests;

pub use loaders::{CatalogLoader, SourceFormat, WindowLoader};
pub use writers::{
    chronology_to_dataframe, metrics_to_dataframe, write_chronology, write_chronology_csv,
    write_chronology_json,
};
