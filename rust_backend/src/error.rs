//! Error types for catalog loading, configuration and scheduling runs.
//!
//! Only malformed input and bad configuration are errors. "No viable field"
//! and "catalog exhausted" are ordinary outcomes and are reported through
//! return values (`Option<Selection>`, [`crate::scheduler::RunStatus`]).

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Error type for survey scheduling.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Data validation error: {0}")]
    DataValidation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl SchedulerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SchedulerError::DataValidation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        SchedulerError::Configuration(msg.into())
    }

    /// `true` for errors caused by the content of the input data.
    pub fn is_validation(&self) -> bool {
        matches!(self, SchedulerError::DataValidation(_))
    }

    /// `true` for errors caused by the run configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SchedulerError::Configuration(_))
    }
}

impl From<polars::prelude::PolarsError> for SchedulerError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        SchedulerError::Parse(e.to_string())
    }
}

/// Parsers report through `anyhow`; typed errors survive the round trip with
/// the context chain folded into the message.
impl From<anyhow::Error> for SchedulerError {
    fn from(e: anyhow::Error) -> Self {
        let message = format!("{:#}", e);
        match e.downcast_ref::<SchedulerError>() {
            Some(SchedulerError::DataValidation(_)) => SchedulerError::DataValidation(message),
            Some(SchedulerError::Configuration(_)) => SchedulerError::Configuration(message),
            _ => SchedulerError::Parse(message),
        }
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(e: serde_json::Error) -> Self {
        SchedulerError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = SchedulerError::validation("dec out of range");
        assert!(err.is_validation());
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "Data validation error: dec out of range");

        let err = SchedulerError::configuration("unknown strategy 'greedy'");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("greedy"));
    }

    #[test]
    fn test_anyhow_conversion_keeps_kind() {
        use anyhow::Context;

        let wrapped: anyhow::Result<()> =
            Err(SchedulerError::validation("bad dec")).context("row 3");
        let err = SchedulerError::from(wrapped.unwrap_err());
        assert!(err.is_validation());
        assert!(err.to_string().contains("row 3"));
        assert!(err.to_string().contains("bad dec"));

        let err = SchedulerError::from(anyhow::anyhow!("truncated file"));
        assert!(matches!(err, SchedulerError::Parse(_)));
    }
}
