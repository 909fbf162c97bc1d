//! Custom error types for the application.
//!
//! This module defines the primary error type, `DaqError`, for the whole crate.
//! Using the `thiserror` crate, it provides a single place to describe the
//! failures that can occur, from configuration problems to digital line I/O and
//! CSV export.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps errors from `figment` while layering defaults, the TOML
//!   file and environment variables.
//! - **`Configuration`**: Semantic errors found by `Settings::validate`, such as
//!   duplicate pin numbers or a zero sampling interval.
//! - **`Line`**: A digital line could not be driven or sampled. This is a
//!   hardware access failure and is distinct from the thermocouple's
//!   open-circuit flag, which is reported as a `Reading`, not an error.
//! - **`Io`**: Wraps `std::io::Error` for file system access.
//! - **`Csv`**: Wraps errors from the `csv` writer used for the output artifact.
//!
//! By using `#[from]`, `DaqError` can be created from the underlying error types
//! with the `?` operator.

use crate::hardware::capabilities::LineError;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum DaqError {
    /// Settings could not be extracted
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Settings parsed but are not usable
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// A digital line could not be claimed, driven or sampled
    #[error("Digital line error: {0}")]
    Line(#[from] LineError),

    /// File system access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV writer failed to serialize or flush
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<figment::Error> for DaqError {
    fn from(value: figment::Error) -> Self {
        DaqError::Config(Box::new(value))
    }
}
