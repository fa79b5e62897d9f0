//! Night-by-night field selection for wide-field imaging surveys.
//!
//! The crate turns a catalog of survey fields and a list of nightly observing
//! windows into a chronology: the ordered record of which field was observed
//! when, and under what sky conditions.
//!
//! - [`astro`]: sidereal time, precession, Moon and Sun positions, airmass.
//! - [`core`]: fields, the catalog, observing windows and the chronology.
//! - [`tactician`]: per-instant viability filtering and strategy scoring.
//! - [`scheduler`]: the night loop that drives the tactician and a clock.
//! - [`services`]: observing window planners.
//! - [`parsing`], [`io`]: CSV/JSON loading and chronology output.
//! - [`preprocessing`]: catalog validation reports.
//! - [`config`]: TOML survey configuration.
//!
//! ```no_run
//! use std::path::Path;
//! use survey_tactician::config::SurveyConfig;
//! use survey_tactician::io::{write_chronology, CatalogLoader, WindowLoader};
//! use survey_tactician::scheduler::Scheduler;
//!
//! let config = SurveyConfig::from_file("survey.toml")?;
//! let catalog = CatalogLoader::load_from_file(Path::new("fields.csv"), config.default_exptime)?;
//! let windows = WindowLoader::load_from_file(Path::new("nights.csv"))?;
//!
//! let mut scheduler =
//!     Scheduler::new(catalog, config.tactician_config(), config.scheduler.clone())?;
//! let summary = scheduler.run(&windows)?;
//! println!("{:?}: {} fields observed", summary.status, summary.entries);
//! write_chronology(scheduler.chronology(), Path::new("chronology.csv"))?;
//! # Ok::<(), survey_tactician::error::SchedulerError>(())
//! ```

pub mod astro;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod parsing;
pub mod preprocessing;
pub mod scheduler;
pub mod services;
pub mod tactician;
pub mod time;

pub use error::{Result, SchedulerError};
