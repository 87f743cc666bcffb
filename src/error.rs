//! Error types for the markovify pipeline

use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, MarkovifyError>;

/// Errors produced while building next-action datasets
#[derive(Error, Debug)]
pub enum MarkovifyError {
    /// Raw input could not be read or does not match the expected table shape
    #[error("Data error: {0}")]
    DataError(String),

    /// Pipeline configuration rejected before any data pass
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Arguments inconsistent with each other or with the data
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A required column is missing from an intermediate table
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Transform was called before fit
    #[error("Not fitted")]
    NotFitted,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for MarkovifyError {
    fn from(err: polars::error::PolarsError) -> Self {
        MarkovifyError::DataError(err.to_string())
    }
}
