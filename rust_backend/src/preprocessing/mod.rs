//! Catalog checks run before scheduling.

pub mod validator;

pub use validator::{CatalogValidator, ValidationResult, ValidationStats};
