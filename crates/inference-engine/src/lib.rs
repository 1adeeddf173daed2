//! Decision-Forest Classifier
//!
//! Bootstrap-aggregated CART trees split on Gini impurity, with
//! class-balanced sample weighting and reproducible seeded training.

mod config;
mod forest;
mod tree;

pub use config::{ClassWeight, ForestConfig, MaxFeatures};
pub use forest::RandomForest;
pub use tree::{DecisionTree, Node, NodeIndex};

use thiserror::Error;

/// Errors during training or inference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Training set is empty")]
    EmptyTrainingSet,
    #[error("Label count mismatch: {features} feature rows, {labels} labels")]
    LabelCountMismatch { features: usize, labels: usize },
    #[error("Invalid label {label} at row {index}: expected 0 or 1")]
    InvalidLabel { index: usize, label: u8 },
    #[error("Non-finite feature value in training row {0}")]
    NonFiniteFeature(usize),
    #[error("Invalid forest configuration: {0}")]
    InvalidConfig(String),
    #[error("Malformed model: {0}")]
    InvalidModel(String),
    #[error("Model was trained on a single class ({class}); vote-fraction probability is undefined")]
    SingleClassModel { class: u8 },
}
