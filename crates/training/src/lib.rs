//! Offline Training Pipeline
//!
//! Builds a labeled vital-sign dataset (CSV or synthetic), fits the scaler
//! and the decision forest, and writes both artifacts.

mod dataset;
mod pipeline;
mod synthetic;

pub use dataset::{TrainingDataset, RISK_CATEGORY_COLUMN};
pub use pipeline::{DatasetSource, TrainedModels, TrainingPipeline, TrainingReport};
pub use synthetic::{
    SyntheticConfig, HEALTHY_MEAN, HEALTHY_STD, HIGH_RISK_MEAN, HIGH_RISK_STD,
};

use data_validator::ScalerError;
use inference_engine::InferenceError;
use scoring::ScoringError;
use storage::StorageError;
use thiserror::Error;

/// Errors during training
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Dataset is missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("Dataset has no usable rows")]
    EmptyDataset,
    #[error("Invalid synthetic data configuration: {0}")]
    InvalidSynthetic(String),
    #[error("Scaler fit failed: {0}")]
    Scaler(#[from] ScalerError),
    #[error("Classifier fit failed: {0}")]
    Classifier(#[from] InferenceError),
    #[error("Artifact write failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Post-training check failed: {0}")]
    Diagnostics(#[from] ScoringError),
}
