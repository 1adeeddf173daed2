//! Scoring Error Types

use data_validator::{ScalerError, ValidationError};
use inference_engine::InferenceError;
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;

/// Who caused a scoring failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Bad request input
    Client,
    /// Model or internal failure
    Server,
}

impl ErrorClass {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Client => "client",
            ErrorClass::Server => "server",
        }
    }
}

/// Errors from a single scoring request
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("Internal scoring error: {0}")]
    Internal(String),
}

impl ScoringError {
    /// Client/server classification
    pub fn class(&self) -> ErrorClass {
        match self {
            ScoringError::Validation(_) => ErrorClass::Client,
            ScoringError::Inference(_) | ScoringError::Internal(_) => ErrorClass::Server,
        }
    }
}

/// Errors while loading model state at process start
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Classifier artifact unavailable: {0}")]
    ClassifierUnavailable(#[source] StorageError),
    #[error("Scaler artifact unavailable and fallback disabled: {0}")]
    ScalerUnavailable(#[source] StorageError),
    #[error("Artifacts did not settle on one generation: {0}")]
    ArtifactMismatch(#[source] StorageError),
    #[error("Fallback scaler bootstrap failed: {0}")]
    Bootstrap(#[from] ScalerError),
}
