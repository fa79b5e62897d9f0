//! Core domain models for survey scheduling.
//!
//! This module defines the fields a survey can observe, the catalog that
//! owns them, the nightly observing windows and the chronology the
//! scheduler produces.

#[macro_use]
pub mod macros;

pub mod checksum;
pub mod domain;

pub use checksum::{calculate_checksum, catalog_checksum};
pub use domain::{
    Band, Chronology, ChronologyEntry, Field, FieldCatalog, FieldId, NightClass, ObservingWindow,
};
