//! Validation Error Types

use thiserror::Error;

/// Errors while validating raw vital-sign input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Wrong number of values
    #[error("Model needs {expected} features, got {actual}")]
    InvalidFeatureCount { expected: usize, actual: usize },

    /// Value is not a finite number
    #[error("Invalid value {token} for {feature} (position {index}): expected a finite number")]
    InvalidFeatureValue {
        index: usize,
        feature: &'static str,
        token: String,
    },
}

/// Errors while fitting the normalizer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalerError {
    /// No rows to fit on
    #[error("Cannot fit scaler on an empty dataset")]
    EmptyDataset,

    /// Training row contains NaN or infinity
    #[error("Non-finite {feature} value in training row {row}")]
    NonFiniteValue { row: usize, feature: &'static str },

    /// Persisted parameters break the fit-time invariants
    #[error("Invalid scaler parameters for {feature}: {reason}")]
    InvalidParams {
        feature: &'static str,
        reason: String,
    },
}
