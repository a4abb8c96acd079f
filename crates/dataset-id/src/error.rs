//! Error types for dataset identification.

use thiserror::Error;

/// Result type alias using DatasetIdError.
pub type Result<T> = std::result::Result<T, DatasetIdError>;

/// Errors raised while matching or registering dataset identifiers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetIdError {
    /// No stored key matches the query.
    #[error("No dataset matching '{0}' found")]
    NotFound(String),

    /// More than one stored key matches the query.
    #[error("No unique dataset matching '{query}': {count} candidates")]
    Ambiguous { query: String, count: usize },

    /// Two wavelength ranges were compared and they differ.
    #[error("Can't compare wavelength ranges {left} and {right}")]
    AmbiguousWavelength { left: String, right: String },

    /// Attempted to register a dataset with a wavelength that differs from its key.
    #[error("Can't change the wavelength of dataset '{key}' from {registered} to {requested}")]
    WavelengthConflict {
        key: String,
        registered: String,
        requested: String,
    },

    /// Neither a name nor a wavelength could be derived for a new key.
    #[error("One of 'name' or 'wavelength_range' must be set to register a dataset")]
    MissingIdentity,

    /// A calibration name that isn't part of the ranking table.
    #[error("Unknown calibration level: {0}")]
    UnknownCalibration(String),
}

impl DatasetIdError {
    /// True if this error means "nothing matched" rather than a contract violation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetIdError::NotFound(_))
    }
}
