//! Vital-Sign Feature Schema
//!
//! Defines the fixed eight-value feature vector consumed by the scaler and
//! the classifier, plus per-column statistics used when fitting.

mod features;
mod statistics;

pub use features::{FeatureVector, VitalSign, FEATURE_DIMENSION};
pub use statistics::{column_statistics, ColumnStatistics};
